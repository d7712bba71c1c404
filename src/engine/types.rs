//! Tipos de dados para requisições e respostas do motor de tradução.
//!
//! Todas as structs derivam `Serialize` e `Deserialize` para conversão JSON
//! conforme o formato retornado pelos endpoints `/jobs/{user_id}` e
//! `/translate` do motor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status de um job de tradução, atribuído pelo servidor.
///
/// O cliente nunca transiciona um job entre estados — apenas lê o rótulo
/// atual retornado pelo motor a cada ciclo de polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Na fila, nenhuma ação disponível.
    Pending,
    /// Em processamento no motor.
    Processing,
    /// Concluído com sucesso; `download_url` garantidamente presente.
    Completed,
    /// Falha terminal; sem link de download.
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

/// Um job de tradução como retornado pelo snapshot do servidor.
///
/// Todos os campos pertencem ao motor; o cliente mantém apenas uma cópia
/// somente-leitura para exibição.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Identificador único atribuído pelo servidor.
    pub id: String,
    /// Nome do arquivo original enviado.
    pub filename: String,
    /// Status atual do job (ver [`JobStatus`]).
    pub status: JobStatus,
    /// Caminho relativo de download, presente apenas quando `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Momento de criação do job no servidor.
    pub created_at: DateTime<Utc>,
}

/// Resposta do endpoint `/translate` quando o job é aceito na fila.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAck {
    /// Status de aceitação ("queued").
    pub status: String,
    /// Identificador do job recém-criado.
    pub job_id: String,
}

/// Um arquivo anexado a uma requisição de tradução (documento ou fonte).
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Nome do arquivo como apresentado ao motor.
    pub filename: String,
    /// Conteúdo binário do arquivo.
    pub bytes: Vec<u8>,
}

/// Carga multipart validada para o endpoint `/translate`.
///
/// Construída pelo submitter após a validação local passar; o campo
/// `api_key` está presente apenas no caminho que ignora a quota do servidor.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// Documento principal (obrigatório).
    pub document: FilePart,
    /// Fonte opcional para incorporação no resultado.
    pub font: Option<FilePart>,
    /// Idioma de destino (fixo em "Indonesian" na configuração de referência).
    pub target_lang: String,
    /// Etiqueta de estilo de tradução.
    pub style: String,
    /// Identidade do usuário dona do job.
    pub user_id: String,
    /// Credencial própria do usuário; ignora a quota do servidor quando presente.
    pub api_key: Option<String>,
}

/// Corpo de erro retornado pelo motor em rejeições (4xx/5xx).
///
/// O campo `detail` carrega a mensagem legível quando o motor fornece uma;
/// ausente em falhas sem contexto.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Mensagem de erro legível, se fornecida pelo motor.
    #[serde(default)]
    pub detail: Option<String>,
}
