//! Tipos de erro para o cliente do motor de tradução.
//!
//! Define [`EngineError`] com variantes para rejeições do motor e falhas de
//! rede. Usa `thiserror` para derivar `Display` e `Error` automaticamente a
//! partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com o motor de tradução.
///
/// As variantes cobrem os dois cenários de falha de uma tentativa:
/// - [`Rejected`](EngineError::Rejected) — o motor retornou um erro HTTP
///   (4xx/5xx), possivelmente com uma mensagem `detail` no corpo
/// - [`Network`](EngineError::Network) — falha na camada de rede
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejeição do motor (ex.: 400 quota esgotada, 500 erro interno).
    /// `detail` carrega a mensagem do corpo da resposta quando presente.
    #[error("engine rejected the request (status {status}): {}", detail.as_deref().unwrap_or("translation request failed"))]
    Rejected {
        status: u16,
        detail: Option<String>,
    },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    /// Encapsula o erro original do `reqwest` via `#[from]`.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl EngineError {
    /// Mensagem voltada ao usuário: o `detail` do motor quando disponível,
    /// senão uma mensagem genérica de falha.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Rejected {
                detail: Some(d), ..
            } => d.clone(),
            EngineError::Rejected { detail: None, .. } => {
                "translation request failed".to_string()
            }
            EngineError::Network(e) => format!("network error: {e}"),
        }
    }
}
