//! Compile-time adapter construction.

use crate::backend::Backend;
use crate::binary_file::BinaryFileBackend;
use crate::descriptor::BackendKind;
use crate::document::DocumentBackend;
use crate::http::HttpJsonBackend;
use crate::orm::MappedSqlBackend;
use crate::sql::SqlBackend;
use crate::text_file::TextFileBackend;
use crate::xml_file::XmlFileBackend;
use crate::xml_store::XmlStoreBackend;
use rosterdb_model::VerifiedEntity;

/// Constructs the adapter for a backend kind.
///
/// The match over the closed [`BackendKind`] enumeration replaces any
/// name-based lookup: an adapter exists for every kind by construction,
/// and unusable descriptors surface configuration errors from `prepare`
/// rather than from here. Adapters come back unprepared.
#[must_use]
pub fn new_backend<E>(kind: BackendKind) -> Box<dyn Backend<E>>
where
    E: VerifiedEntity + 'static,
{
    match kind {
        BackendKind::FileBinary => Box::new(BinaryFileBackend::new()),
        BackendKind::FileXml => Box::new(XmlFileBackend::new()),
        BackendKind::FileText => Box::new(TextFileBackend::new()),
        BackendKind::RelationalSql => Box::new(SqlBackend::new()),
        BackendKind::RelationalOrm => Box::new(MappedSqlBackend::new()),
        BackendKind::DocumentStore => Box::new(DocumentBackend::new()),
        BackendKind::XmlNative => Box::new(XmlStoreBackend::new()),
        BackendKind::HttpJson => Box::new(HttpJsonBackend::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::Rec;

    #[test]
    fn every_kind_constructs() {
        for kind in BackendKind::ALL {
            let _adapter: Box<dyn Backend<Rec>> = new_backend(kind);
        }
    }
}
