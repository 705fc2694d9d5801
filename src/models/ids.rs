//! Traducción de identificadores
//!
//! El almacén de documentos identifica cada documento como `<tipo>-<número>`
//! (por ejemplo `vehicle-1699999999999`), mientras que la API expone IDs
//! numéricos. Los prefijos del almacén no deben salir de esta capa.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use thiserror::Error;
use tracing::warn;

/// Prefijo de los borradores en el almacén
pub const DRAFTS_PREFIX: &str = "drafts.";

/// Tipos de documento conocidos por el almacén
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    User,
    Vehicle,
    VehicleLocationHistory,
    Message,
    Request,
    Notification,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 6] = [
        DocumentKind::User,
        DocumentKind::Vehicle,
        DocumentKind::VehicleLocationHistory,
        DocumentKind::Message,
        DocumentKind::Request,
        DocumentKind::Notification,
    ];

    /// Nombre del tipo tal como aparece en `_type` y en el prefijo del ID
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::User => "user",
            DocumentKind::Vehicle => "vehicle",
            DocumentKind::VehicleLocationHistory => "vehicleLocationHistory",
            DocumentKind::Message => "message",
            DocumentKind::Request => "request",
            DocumentKind::Notification => "notification",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == prefix)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("identifiant vide")]
    Empty,

    #[error("préfixe inconnu '{0}'")]
    UnknownPrefix(String),

    #[error("type attendu '{expected}', reçu '{found}'")]
    WrongKind {
        expected: DocumentKind,
        found: DocumentKind,
    },

    #[error("'{0}' n'est pas numérique")]
    NotNumeric(String),

    #[error("{0} n'est pas un identifiant positif")]
    NotPositive(i64),
}

/// Identificador canónico: tipo de documento + número positivo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId {
    kind: DocumentKind,
    number: i64,
}

impl DocumentId {
    pub fn new(kind: DocumentKind, number: i64) -> Result<Self, IdError> {
        if number <= 0 {
            return Err(IdError::NotPositive(number));
        }
        Ok(Self { kind, number })
    }

    /// Analiza `"<tipo>-<n>"`, `"drafts.<tipo>-<n>"` o un `"<n>"` desnudo.
    pub fn parse(kind: DocumentKind, raw: &str) -> Result<Self, IdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IdError::Empty);
        }

        let raw = raw.strip_prefix(DRAFTS_PREFIX).unwrap_or(raw);
        let suffix = match raw.split_once('-') {
            Some((prefix, suffix)) => {
                let found = DocumentKind::from_prefix(prefix)
                    .ok_or_else(|| IdError::UnknownPrefix(prefix.to_string()))?;
                if found != kind {
                    return Err(IdError::WrongKind {
                        expected: kind,
                        found,
                    });
                }
                suffix
            }
            None => raw,
        };

        let number = suffix
            .parse::<i64>()
            .map_err(|_| IdError::NotNumeric(suffix.to_string()))?;
        Self::new(kind, number)
    }

    /// Analiza un ID del almacén cuyo tipo no se conoce de antemano
    pub fn parse_store(raw: &str) -> Result<Self, IdError> {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix(DRAFTS_PREFIX).unwrap_or(trimmed);
        if bare.is_empty() {
            return Err(IdError::Empty);
        }
        let (prefix, _) = bare
            .split_once('-')
            .ok_or_else(|| IdError::UnknownPrefix(bare.to_string()))?;
        let kind = DocumentKind::from_prefix(prefix)
            .ok_or_else(|| IdError::UnknownPrefix(prefix.to_string()))?;
        Self::parse(kind, bare)
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn store_id(&self) -> String {
        format!("{}-{}", self.kind.as_str(), self.number)
    }

    pub fn draft_id(&self) -> String {
        format!("{}{}", DRAFTS_PREFIX, self.store_id())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.as_str(), self.number)
    }
}

/// Formatea el ID del almacén para un número ya validado
pub fn store_id(kind: DocumentKind, number: i64) -> String {
    format!("{}-{}", kind.as_str(), number)
}

/// Devuelve el sufijo de un ID del almacén (`vehicle-12345` → `12345`).
///
/// Sin validación numérica: si no hay `-` devuelve la entrada tal cual y deja
/// un warning. Los llamadores que necesiten un número usan [`coerce_numeric_id`].
pub fn extract_id(store_id: &str) -> String {
    match store_id.split('-').nth(1) {
        Some(suffix) => suffix.to_string(),
        None => {
            warn!("⚠️ ID sin formato '<tipo>-<id>': '{}'", store_id);
            store_id.to_string()
        }
    }
}

/// Convierte un sufijo a número; cualquier fallo da 0 (el llamador filtra `<= 0`).
pub fn coerce_numeric_id(suffix: &str) -> i64 {
    suffix.trim().parse::<i64>().unwrap_or(0)
}

static LAST_ISSUED: AtomicI64 = AtomicI64::new(0);

/// Siguiente número de documento: milisegundos actuales, estrictamente creciente
/// dentro del proceso.
pub fn next_document_number() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_ISSUED.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ISSUED.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed)
        {
            Ok(_) => return candidate,
            Err(current) => last = current,
        }
    }
}
