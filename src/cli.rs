//! Interface de linha de comando do terjemah baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (submit, jobs, watch,
//! quota, status, login, logout) e a flag global `--verbose`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::submit::Style;

/// terjemah — cliente de tradução assíncrona de EPUBs.
#[derive(Debug, Parser)]
#[command(name = "terjemah", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Estilo de tradução aceito pela CLI, mapeado para [`Style`](crate::submit::Style) internamente.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StyleArg {
    /// Formal porém natural.
    FormalNatural,
    /// Novel de fantasia, imersivo e dramático (padrão).
    NovelFantasy,
    /// Casual e fácil de ler.
    Casual,
    /// Literário e poético.
    Literary,
}

impl From<StyleArg> for Style {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::FormalNatural => Style::FormalNatural,
            StyleArg::NovelFantasy => Style::NovelFantasy,
            StyleArg::Casual => Style::Casual,
            StyleArg::Literary => Style::Literary,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Envia um EPUB para tradução.
    Submit {
        /// Caminho do arquivo EPUB a traduzir.
        file: PathBuf,

        /// Fonte opcional (TTF/OTF) para incorporação no resultado.
        #[arg(long)]
        font: Option<PathBuf>,

        /// Estilo de tradução.
        #[arg(long, value_enum, default_value = "novel-fantasy")]
        style: StyleArg,

        /// Usa a credencial própria em vez da quota do servidor.
        #[arg(long)]
        own_key: bool,

        /// Credencial própria; implica `--own-key`.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Lista o snapshot atual de jobs (mesmo caminho do refresh manual).
    Jobs,

    /// Observa a lista de jobs com polling periódico até Ctrl-C.
    Watch,

    /// Mostra a quota de uso do servidor.
    Quota,

    /// Shows engine reachability and the current session.
    Status,

    /// Delega o login ao fluxo OAuth do provedor de identidade.
    Login {
        /// Provedor OAuth a usar.
        #[arg(default_value = "google")]
        provider: String,
    },

    /// Encerra a sessão atual e limpa o estado local.
    Logout,
}
