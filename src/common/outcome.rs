// src/common/outcome.rs

/// Resultado interno das chamadas aos provedores externos (WhatsApp, Dialogflow,
/// CRM). O contrato externo continua "sem exceção": quem chama recebe no máximo
/// um `Option`, mas internamente distinguimos "não havia nada a fazer"
/// (integração não configurada, destino ausente) de "o provedor falhou".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// A chamada foi feita e o provedor respondeu.
    Done(T),
    /// No-op intencional: integração desabilitada ou sem dados para enviar.
    Skipped,
    /// O provedor falhou; o erro já foi logado no ponto da chamada.
    Failed,
}

impl<T> Outcome<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Skipped | Outcome::Failed => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Skipped => Outcome::Skipped,
            Outcome::Failed => Outcome::Failed,
        }
    }
}
