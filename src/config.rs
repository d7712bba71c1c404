//! Configuração do terjemah carregada a partir de `terjemah.toml`.
//!
//! A struct [`TerjemahConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `GEMINI_API_KEY` e `TERJEMAH_API_BASE` têm
//! precedência sobre o arquivo.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuração de nível superior carregada de `terjemah.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TerjemahConfig {
    /// URL base do motor de tradução.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// URL base da consulta de quota (`{quota_url}/{user_id}`).
    /// Ausente desabilita a consulta; a exibição fica em 0.
    #[serde(default)]
    pub quota_url: Option<String>,

    /// Intervalo do polling da lista de jobs, em segundos.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Idioma de destino enviado ao motor.
    #[serde(default = "default_target_lang")]
    pub target_lang: String,

    /// Credencial própria do usuário (caminho que ignora a quota do servidor).
    #[serde(default)]
    pub api_key: String,

    /// Identidade da sessão persistida (atribuída pelo provedor OAuth).
    #[serde(default)]
    pub user_id: String,

    /// E-mail da sessão persistida.
    #[serde(default)]
    pub email: String,
}

// Valor padrão para a base da API: instância local do motor.
fn default_api_base() -> String {
    "http://localhost:8000".to_string()
}

// Valor padrão para o intervalo de polling: 5 segundos.
fn default_poll_interval_secs() -> u64 {
    5
}

// Valor padrão para o idioma de destino.
fn default_target_lang() -> String {
    "Indonesian".to_string()
}

impl Default for TerjemahConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            quota_url: None,
            poll_interval_secs: default_poll_interval_secs(),
            target_lang: default_target_lang(),
            api_key: String::new(),
            user_id: String::new(),
            email: String::new(),
        }
    }
}

impl TerjemahConfig {
    /// Carrega a configuração de `terjemah.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        let path = Path::new("terjemah.toml");
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<TerjemahConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variáveis de ambiente têm precedência sobre o arquivo de configuração.
        if let Ok(key) = std::env::var("GEMINI_API_KEY")
            && !key.is_empty()
        {
            config.api_key = key;
        }
        if let Ok(base) = std::env::var("TERJEMAH_API_BASE")
            && !base.is_empty()
        {
            config.api_base = base;
        }

        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
