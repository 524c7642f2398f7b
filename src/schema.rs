//! Assemble the full schema document from registry metadata.

use crate::registry::Registry;

/// Build the schema-definition document: the Ref input, every typedef, the
/// Query block, and the Mutation block. The Mutation block is omitted when
/// no entity exposes a mutation surface.
pub fn build_document<'a, I>(registries: I) -> String
where
    I: IntoIterator<Item = &'a Registry>,
{
    let mut typedefs = Vec::new();
    let mut queries = Vec::new();
    let mut mutations = Vec::new();
    for registry in registries {
        typedefs.push(registry.typedef());
        queries.extend(registry.queries());
        if let Some(m) = registry.mutations() {
            mutations.extend(m);
        }
    }

    let mut doc = String::from("input Ref {\n\tid: ID!\n}\n\n");
    for typedef in &typedefs {
        doc.push_str(typedef);
        doc.push_str("\n\n");
    }
    doc.push_str("type Query {\n");
    for query in &queries {
        doc.push('\t');
        doc.push_str(query);
        doc.push('\n');
    }
    doc.push_str("}\n");
    if !mutations.is_empty() {
        doc.push_str("\ntype Mutation {\n");
        for mutation in &mutations {
            doc.push('\t');
            doc.push_str(mutation);
            doc.push('\n');
        }
        doc.push_str("}\n");
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldSpec, HistoryMode, ModelDescriptor, ScalarType};
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use sqlx::SqlitePool;
    use std::str::FromStr;

    fn lazy_pool() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        SqlitePoolOptions::new().connect_lazy_with(options)
    }

    fn widget() -> Registry {
        Registry::new(
            "Widget",
            ModelDescriptor::new().field("name", FieldSpec::scalar(ScalarType::Text)),
            lazy_pool(),
        )
        .unwrap()
    }

    fn private_audit() -> Registry {
        Registry::new(
            "Audit",
            ModelDescriptor::new()
                .field("entry", FieldSpec::scalar(ScalarType::Text))
                .with_history(HistoryMode::Private),
            lazy_pool(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn document_contains_ref_typedefs_queries_and_mutations() {
        let widget = widget();
        let audit = private_audit();
        let doc = build_document([&widget, &audit]);
        assert!(doc.starts_with("input Ref {\n\tid: ID!\n}\n\n"));
        assert!(doc.contains("type Widget {\n\tid: ID\n\tname: String\n}"));
        assert!(doc.contains("type Audit {\n\tid: ID\n\tentry: String\n}"));
        assert!(doc.contains("\tfindWidget: [Widget!]!\n"));
        assert!(doc.contains("\tgetWidget(id: String): Widget\n"));
        assert!(doc.contains("\tsaveWidget(id: String, name: String): Widget\n"));
        assert!(!doc.contains("saveAudit"));
    }

    #[tokio::test]
    async fn mutation_block_is_omitted_when_every_entity_is_private() {
        let audit = private_audit();
        let doc = build_document([&audit]);
        assert!(doc.contains("type Query {"));
        assert!(!doc.contains("type Mutation"));
    }
}
