//! Camada de exibição no terminal — tabela de jobs, badges e spinner.
//!
//! Usa as crates `console` para estilização com cores e `indicatif` para o
//! spinner exibido durante o envio. [`JobListView`] é uma projeção pura da
//! lista de jobs em cache para linhas renderizadas; nenhum estado vive aqui.

use chrono::{DateTime, Local, Utc};
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::{Job, JobStatus};
use crate::quota::SERVER_QUOTA_CEILING;

/// Projeção pura da lista de jobs em cache para uma tabela de terminal.
///
/// A ordem do servidor é preservada (sem reordenação local). Cada job rende
/// nome do arquivo, data/hora local, um badge de status e uma célula de ação:
/// link de download quando concluído, indicador de falha quando falhou e um
/// marcador neutro de espera nos demais casos.
pub struct JobListView {
    // Base da API para resolver caminhos relativos de download.
    base_url: String,
    green: Style,
    red: Style,
    cyan: Style,
    dim: Style,
}

impl JobListView {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            cyan: Style::new().cyan(),
            dim: Style::new().dim(),
        }
    }

    /// Renderiza a tabela completa; lista vazia vira um placeholder.
    pub fn render(&self, jobs: &[Job]) -> String {
        if jobs.is_empty() {
            return format!("{}\n", self.dim.apply_to("No translation history yet."));
        }
        let mut out = String::new();
        out.push_str(&format!(
            "{:<32} {:<16} {:<14} ACTION\n",
            "FILE", "WHEN", "STATUS"
        ));
        for job in jobs {
            out.push_str(&self.render_row(job));
            out.push('\n');
        }
        out
    }

    fn render_row(&self, job: &Job) -> String {
        format!(
            "{:<32} {:<16} {:<14} {}",
            truncate(&job.filename, 30),
            format_when(&job.created_at),
            self.status_badge(job.status),
            self.action_cell(job),
        )
    }

    /// Badge visual para cada um dos quatro status do servidor.
    pub fn status_badge(&self, status: JobStatus) -> String {
        match status {
            JobStatus::Completed => self.green.apply_to("✓ completed").to_string(),
            JobStatus::Processing => self.cyan.apply_to("↻ processing").to_string(),
            JobStatus::Failed => self.red.apply_to("✗ failed").to_string(),
            JobStatus::Pending => self.dim.apply_to("• pending").to_string(),
        }
    }

    /// Célula de ação: download resolvido contra a base da API quando
    /// concluído, indicador de falha quando falhou, espera nos demais.
    pub fn action_cell(&self, job: &Job) -> String {
        match (job.status, &job.download_url) {
            (JobStatus::Completed, Some(path)) => {
                format!("download: {}{}", self.base_url, path)
            }
            (JobStatus::Failed, _) => self.red.apply_to("failed").to_string(),
            _ => self.dim.apply_to("waiting...").to_string(),
        }
    }

    /// Badge de quota `usado/teto`, em vermelho quando esgotada.
    pub fn quota_badge(&self, used: u32) -> String {
        let text = format!("{used}/{SERVER_QUOTA_CEILING}");
        if used >= SERVER_QUOTA_CEILING {
            self.red.apply_to(text).to_string()
        } else {
            text
        }
    }
}

// Data/hora local no formato curto da listagem (dia mês | hora:minuto).
fn format_when(created_at: &DateTime<Utc>) -> String {
    created_at
        .with_timezone(&Local)
        .format("%d %b | %H:%M")
        .to_string()
}

fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let cut: String = name.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

/// Indicador visual do envio de uma submissão.
///
/// Exibe um spinner animado enquanto a tentativa está em voo e mensagens
/// coloridas para aceitação (verde) e rejeição (vermelho).
pub struct SubmitProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl SubmitProgress {
    /// Inicia o spinner com o nome do arquivo sendo enviado.
    pub fn start(filename: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("submitting {filename}..."));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    /// Finaliza o spinner com o resultado da tentativa.
    pub fn accepted(&self, job_id: &str) {
        self.pb.finish_and_clear();
        println!(
            "  {} queued for translation (job {job_id})",
            self.green.apply_to("✓")
        );
    }

    pub fn rejected(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.red.apply_to("✗"));
    }
}
