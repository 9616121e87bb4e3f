//! `SeaQuery` statements for schema tables.

use folio_core::document::{Condition, Filter, Query, ValidationError, Value};
use folio_core::schema::types::{
    CANCELLED_COLUMN, IDX_COLUMN, NAME_COLUMN, PARENT_COLUMN, PARENT_FIELD_COLUMN,
    SUBMITTED_COLUMN,
};
use folio_core::schema::{FieldType, Schema};
use sea_orm::sea_query::{
    Alias, ColumnDef, Cond, Expr, Index, IndexCreateStatement, Order, Query as SqlQuery,
    SelectStatement, SimpleExpr, Table, TableAlterStatement, TableCreateStatement,
};

use super::codec::encode;

/// Columns of a result set with their types, in select order.
pub(crate) type Columns = Vec<(String, FieldType)>;

fn column_def(name: &str, field_type: &FieldType) -> ColumnDef {
    let mut def = ColumnDef::new(Alias::new(name));
    match field_type {
        FieldType::Int | FieldType::Currency { .. } => def.big_integer(),
        FieldType::Float => def.double(),
        FieldType::Check => def.boolean().not_null().default(false),
        _ => def.text(),
    };
    def
}

/// `CREATE TABLE IF NOT EXISTS` for a schema, system columns first.
pub(crate) fn create_table(schema: &Schema) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(Alias::new(schema.name()))
        .if_not_exists()
        .col(ColumnDef::new(Alias::new(NAME_COLUMN)).text().not_null().primary_key());
    if schema.is_child() {
        stmt.col(ColumnDef::new(Alias::new(PARENT_COLUMN)).text().not_null())
            .col(ColumnDef::new(Alias::new(PARENT_FIELD_COLUMN)).text().not_null())
            .col(ColumnDef::new(Alias::new(IDX_COLUMN)).big_integer().not_null());
    } else {
        stmt.col(
            ColumnDef::new(Alias::new(SUBMITTED_COLUMN))
                .boolean()
                .not_null()
                .default(false),
        )
        .col(
            ColumnDef::new(Alias::new(CANCELLED_COLUMN))
                .boolean()
                .not_null()
                .default(false),
        );
    }
    for field in schema.column_fields() {
        stmt.col(&mut column_def(&field.name, &field.field_type));
    }
    stmt.to_owned()
}

/// `ALTER TABLE .. ADD COLUMN` for a field added after the table was created.
pub(crate) fn add_column(schema: &Schema, name: &str, field_type: &FieldType) -> TableAlterStatement {
    Table::alter()
        .table(Alias::new(schema.name()))
        .add_column(&mut column_def(name, field_type))
        .to_owned()
}

/// Index over a child table's owner and position.
pub(crate) fn create_parent_index(schema: &Schema) -> IndexCreateStatement {
    Index::create()
        .name(format!("idx_{}_parent", schema.name().to_lowercase()))
        .table(Alias::new(schema.name()))
        .col(Alias::new(PARENT_COLUMN))
        .col(Alias::new(PARENT_FIELD_COLUMN))
        .col(Alias::new(IDX_COLUMN))
        .if_not_exists()
        .to_owned()
}

/// Every column of a schema's table with its type, system columns first.
pub(crate) fn all_columns(schema: &Schema) -> Columns {
    schema
        .system_columns()
        .iter()
        .filter_map(|c| schema.column_type(c).map(|t| ((*c).to_string(), t)))
        .chain(
            schema
                .column_fields()
                .map(|f| (f.name.clone(), f.field_type.clone())),
        )
        .collect()
}

/// Compiles a normalized query.
///
/// Rows are ordered by the requested sort keys, then by position for child
/// tables and by key otherwise, so paging is stable.
pub(crate) fn select(
    schema: &Schema,
    query: &Query,
) -> Result<(SelectStatement, Columns), ValidationError> {
    let columns = match &query.fields {
        None => all_columns(schema),
        Some(fields) => fields
            .iter()
            .map(|f| {
                schema
                    .column_type(f)
                    .map(|t| (f.clone(), t))
                    .ok_or_else(|| ValidationError::new(schema.name(), f, "unknown column"))
            })
            .collect::<Result<_, _>>()?,
    };

    let mut stmt = SqlQuery::select();
    stmt.columns(columns.iter().map(|(name, _)| Alias::new(name)))
        .from(Alias::new(schema.name()))
        .cond_where(conditions(schema, &query.filters)?);

    for sort in &query.sort {
        let order = if sort.descending { Order::Desc } else { Order::Asc };
        stmt.order_by(Alias::new(&sort.field), order);
    }
    if schema.is_child() {
        stmt.order_by(Alias::new(PARENT_COLUMN), Order::Asc)
            .order_by(Alias::new(IDX_COLUMN), Order::Asc);
    }
    stmt.order_by(Alias::new(NAME_COLUMN), Order::Asc);

    if let Some(page) = query.page {
        stmt.limit(page.limit()).offset(page.offset());
    }
    Ok((stmt, columns))
}

fn conditions(schema: &Schema, filters: &[Filter]) -> Result<Cond, ValidationError> {
    let mut cond = Cond::all();
    for filter in filters {
        cond = cond.add(predicate(schema, filter)?);
    }
    Ok(cond)
}

/// Translates one filter. An empty `in` list is constant false.
fn predicate(schema: &Schema, filter: &Filter) -> Result<SimpleExpr, ValidationError> {
    let field_type = schema
        .column_type(&filter.field)
        .ok_or_else(|| ValidationError::new(schema.name(), &filter.field, "unknown column"))?;
    let operand = |v: &Value| encode(schema.name(), &filter.field, &field_type, v);
    let col = || Expr::col(Alias::new(&filter.field));

    Ok(match &filter.condition {
        Condition::Eq(v) => col().eq(operand(v)?),
        Condition::Ne(v) => col().ne(operand(v)?),
        Condition::Gt(v) => col().gt(operand(v)?),
        Condition::Lt(v) => col().lt(operand(v)?),
        Condition::Ge(v) => col().gte(operand(v)?),
        Condition::Le(v) => col().lte(operand(v)?),
        Condition::In(values) if values.is_empty() => Expr::val(1).eq(0),
        Condition::In(values) => {
            let operands = values.iter().map(operand).collect::<Result<Vec<_>, _>>()?;
            col().is_in(operands)
        }
        Condition::Like(pattern) => col().like(pattern.as_str()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::schema::SchemaSet;
    use sea_orm::sea_query::SqliteQueryBuilder;

    fn schemas() -> SchemaSet {
        SchemaSet::builtin().unwrap()
    }

    #[test]
    fn test_create_table_has_system_columns() {
        let set = schemas();
        let sql = create_table(set.get("Party").unwrap()).to_string(SqliteQueryBuilder);
        assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "Party""#));
        assert!(sql.contains(r#""name" text"#));
        assert!(sql.contains(r#""submitted""#));
        assert!(!sql.contains(r#""parent""#));

        let sql = create_table(set.get("SalesInvoiceItem").unwrap()).to_string(SqliteQueryBuilder);
        assert!(sql.contains(r#""idx""#));
        assert!(!sql.contains(r#""submitted""#));
        // Table fields have no column.
        let sql = create_table(set.get("SalesInvoice").unwrap()).to_string(SqliteQueryBuilder);
        assert!(!sql.contains(r#""items""#));
    }

    #[test]
    fn test_empty_in_is_constant_false() {
        let set = schemas();
        let query = Query::new().filter(Filter::is_in("name", Vec::<&str>::new()));
        let (stmt, _) = select(set.get("Party").unwrap(), &query).unwrap();
        let sql = stmt.to_string(SqliteQueryBuilder);
        assert!(sql.contains("1 = 0"), "{sql}");
    }

    #[test]
    fn test_default_order_is_stable() {
        let set = schemas();
        let (stmt, columns) = select(set.get("SalesInvoiceItem").unwrap(), &Query::new()).unwrap();
        let sql = stmt.to_string(SqliteQueryBuilder);
        assert!(sql.ends_with(r#"ORDER BY "parent" ASC, "idx" ASC, "name" ASC"#), "{sql}");
        assert_eq!(columns[0].0, "name");
    }

    #[test]
    fn test_selected_columns_only() {
        let set = schemas();
        let query = Query::new().select(["party_name"]);
        let (_, columns) = select(set.get("Party").unwrap(), &query).unwrap();
        assert_eq!(columns.len(), 1);

        let query = Query::new().select(["nope"]);
        assert!(select(set.get("Party").unwrap(), &query).is_err());
    }
}
