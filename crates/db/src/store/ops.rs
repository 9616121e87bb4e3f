//! Document operations shared by the store and its transactions.
//!
//! Every function takes the connection to run on, so the same code serves
//! pooled reads and writes inside a transaction.

use std::collections::BTreeMap;

use folio_core::document::{
    Condition, DocStatus, Document, DocumentInput, FieldMap, Filter, ParentRef, Query, Row,
    ValidationError, Value, check_required, normalize_query, validate_create, validate_input,
};
use folio_core::ledger::LEDGER_COLLECTION;
use folio_core::schema::types::{
    CANCELLED_COLUMN, IDX_COLUMN, NAME_COLUMN, PARENT_COLUMN, PARENT_FIELD_COLUMN,
    SUBMITTED_COLUMN,
};
use folio_core::schema::{FieldType, Naming, Schema, SchemaSet};
use folio_shared::types::PageRequest;
use sea_orm::sea_query::{Alias, Expr, OnConflict, Query as SqlQuery, SimpleExpr};
use sea_orm::{
    ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryResult, Set, Statement,
    StatementBuilder, Value as SqlValue,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::codec::{decode, encode};
use super::error::StoreError;
use super::sql::{self, Columns};
use crate::entities::number_series;
use crate::repositories::ledger;

async fn exec<C, S>(conn: &C, stmt: &S) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
    S: StatementBuilder,
{
    let result = conn.execute(conn.get_database_backend().build(stmt)).await?;
    Ok(result.rows_affected())
}

/// Creates missing schema tables, child indexes and columns added to a
/// schema since its table was created.
pub(crate) async fn sync_tables<C: ConnectionTrait>(
    conn: &C,
    schemas: &SchemaSet,
) -> Result<(), DbErr> {
    for schema in schemas.iter() {
        exec(conn, &sql::create_table(schema)).await?;
        if schema.is_child() {
            exec(conn, &sql::create_parent_index(schema)).await?;
        }

        let existing = table_columns(conn, schema.name()).await?;
        for field in schema
            .column_fields()
            .filter(|f| !existing.contains(&f.name))
        {
            info!(schema = schema.name(), field = %field.name, "adding column");
            exec(conn, &sql::add_column(schema, &field.name, &field.field_type)).await?;
        }
    }
    Ok(())
}

async fn table_columns<C: ConnectionTrait>(conn: &C, table: &str) -> Result<Vec<String>, DbErr> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Sqlite,
        "SELECT name FROM pragma_table_info(?)",
        [table.into()],
    );
    conn.query_all(stmt)
        .await?
        .iter()
        .map(|row| row.try_get::<String>("", "name"))
        .collect()
}

/// Runs a query after checking it against the schema.
pub(crate) async fn query<C: ConnectionTrait>(
    conn: &C,
    schema: &Schema,
    query: &Query,
) -> Result<Vec<Row>, StoreError> {
    let query = normalize_query(schema, query)?;
    let (stmt, columns) = sql::select(schema, &query)?;
    let results = conn
        .query_all(conn.get_database_backend().build(&stmt))
        .await?;
    let rows = results
        .iter()
        .map(|result| decode_row(result, &columns))
        .collect::<Result<_, _>>()?;
    Ok(rows)
}

fn decode_row(result: &QueryResult, columns: &Columns) -> Result<Row, DbErr> {
    columns
        .iter()
        .map(|(name, field_type)| Ok((name.clone(), decode(field_type, result, name)?)))
        .collect()
}

fn take_text(row: &mut Row, column: &str) -> String {
    match row.remove(column) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

fn into_document(schema: &Schema, mut row: Row) -> Document {
    let name = take_text(&mut row, NAME_COLUMN);
    let (status, parent) = if schema.is_child() {
        let parent = take_text(&mut row, PARENT_COLUMN);
        let parent_field = take_text(&mut row, PARENT_FIELD_COLUMN);
        let idx = row
            .remove(IDX_COLUMN)
            .and_then(|v| v.as_i64())
            .unwrap_or_default();
        (
            DocStatus::Draft,
            Some(ParentRef {
                parent,
                parent_field,
                idx,
            }),
        )
    } else {
        let flag = |v: Option<Value>| v.and_then(|v| v.as_bool()).unwrap_or(false);
        let submitted = flag(row.remove(SUBMITTED_COLUMN));
        let cancelled = flag(row.remove(CANCELLED_COLUMN));
        (DocStatus::from_flags(submitted, cancelled), None)
    };
    Document {
        schema_name: schema.name().to_string(),
        name,
        status,
        fields: row,
        children: BTreeMap::new(),
        parent,
    }
}

/// Reads a document and its child rows, ordered by `idx`.
pub(crate) async fn fetch<C: ConnectionTrait>(
    conn: &C,
    schemas: &SchemaSet,
    schema: &Schema,
    name: &str,
) -> Result<Option<Document>, StoreError> {
    let lookup = Query::new().filter(Filter::eq(NAME_COLUMN, name));
    let Some(row) = query(conn, schema, &lookup).await?.pop() else {
        return Ok(None);
    };
    let mut doc = into_document(schema, row);

    for (table, child_name) in schema.table_fields() {
        let child = schemas.get(child_name)?;
        let rows = query(conn, child, &children_of(name, table)).await?;
        doc.children.insert(
            table.to_string(),
            rows.into_iter().map(|r| into_document(child, r)).collect(),
        );
    }
    Ok(Some(doc))
}

/// Reads a document that must exist.
pub(crate) async fn get<C: ConnectionTrait>(
    conn: &C,
    schemas: &SchemaSet,
    schema: &Schema,
    name: &str,
) -> Result<Document, StoreError> {
    fetch(conn, schemas, schema, name)
        .await?
        .ok_or_else(|| StoreError::not_found(schema.name(), name))
}

fn children_of(parent: &str, table: &str) -> Query {
    Query::new()
        .filter(Filter::eq(PARENT_COLUMN, parent))
        .filter(Filter::eq(PARENT_FIELD_COLUMN, table))
}

/// First key of a row matching every filter.
async fn find_key<C: ConnectionTrait>(
    conn: &C,
    schema: &Schema,
    filters: Vec<Filter>,
) -> Result<Option<String>, StoreError> {
    let lookup = Query {
        filters,
        fields: Some(vec![NAME_COLUMN.to_string()]),
        sort: Vec::new(),
        page: Some(PageRequest::new(1, 1)),
    };
    let mut rows = query(conn, schema, &lookup).await?;
    Ok(rows.pop().map(|mut row| take_text(&mut row, NAME_COLUMN)))
}

async fn exists<C: ConnectionTrait>(
    conn: &C,
    schema: &Schema,
    name: &str,
) -> Result<bool, StoreError> {
    Ok(find_key(conn, schema, vec![Filter::eq(NAME_COLUMN, name)])
        .await?
        .is_some())
}

fn child_schema<'s>(
    schemas: &'s SchemaSet,
    schema: &Schema,
    table: &str,
) -> Result<&'s Schema, StoreError> {
    match schema.field(table).map(|f| &f.field_type) {
        Some(FieldType::Table { child }) => Ok(schemas.get(child)?),
        _ => Err(ValidationError::new(schema.name(), table, "not a table field").into()),
    }
}

/// Checks link targets exist and unique values are not taken.
///
/// `own_name` excludes the document itself from the uniqueness check.
async fn check_references<C: ConnectionTrait>(
    conn: &C,
    schemas: &SchemaSet,
    schema: &Schema,
    own_name: Option<&str>,
    values: &FieldMap,
) -> Result<(), StoreError> {
    for (field_name, value) in values {
        if value.is_null() {
            continue;
        }
        let Some(field) = schema.field(field_name) else {
            continue;
        };

        if let FieldType::Link { target } = &field.field_type {
            let key = value.as_str().unwrap_or_default();
            if !exists(conn, schemas.get(target)?, key).await? {
                return Err(ValidationError::new(
                    schema.name(),
                    field_name,
                    format!("{target} {key:?} does not exist"),
                )
                .into());
            }
        }

        if field.unique {
            let mut filters = vec![Filter::new(
                field_name.clone(),
                Condition::Eq(value.clone()),
            )];
            if let Some(own) = own_name {
                filters.push(Filter::ne(NAME_COLUMN, own));
            }
            if let Some(other) = find_key(conn, schema, filters).await? {
                return Err(ValidationError::new(
                    schema.name(),
                    field_name,
                    format!("{value} is already used by {other}"),
                )
                .into());
            }
        }
    }
    Ok(())
}

async fn check_tables<C: ConnectionTrait>(
    conn: &C,
    schemas: &SchemaSet,
    schema: &Schema,
    tables: &BTreeMap<String, Vec<FieldMap>>,
) -> Result<(), StoreError> {
    for (table, rows) in tables {
        let child = child_schema(schemas, schema, table)?;
        for row in rows {
            check_references(conn, schemas, child, None, row).await?;
        }
    }
    Ok(())
}

fn random_name() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Hands out the next `PREFIX-00001` name of a series.
async fn next_in_series<C: ConnectionTrait>(conn: &C, prefix: &str) -> Result<String, DbErr> {
    let counter = number_series::ActiveModel {
        prefix: Set(prefix.to_string()),
        current: Set(1),
    };
    number_series::Entity::insert(counter)
        .on_conflict(
            OnConflict::column(number_series::Column::Prefix)
                .value(
                    number_series::Column::Current,
                    Expr::col(number_series::Column::Current).add(1),
                )
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    let current = number_series::Entity::find_by_id(prefix.to_string())
        .one(conn)
        .await?
        .map_or(1, |series| series.current);
    Ok(format!("{prefix}-{current:05}"))
}

/// Picks the primary key of a new document.
///
/// `Field` naming always uses the field value. Otherwise an explicit name
/// in the input wins over the policy.
async fn assign_name<C: ConnectionTrait>(
    conn: &C,
    schema: &Schema,
    input: &DocumentInput,
    values: &FieldMap,
) -> Result<String, StoreError> {
    if let Naming::Field(field) = schema.naming() {
        return values
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ValidationError::new(schema.name(), field, "value is required").into());
    }
    if let Some(name) = input.name.as_deref().filter(|n| !n.trim().is_empty()) {
        return Ok(name.to_string());
    }
    match schema.naming() {
        Naming::Manual => {
            Err(ValidationError::new(schema.name(), NAME_COLUMN, "name is required").into())
        }
        Naming::Series(prefix) => Ok(next_in_series(conn, prefix).await?),
        Naming::Random | Naming::Field(_) => Ok(random_name()),
    }
}

fn encode_fields(
    schema: &Schema,
    values: &FieldMap,
) -> Result<Vec<(String, SqlValue)>, ValidationError> {
    values
        .iter()
        .filter_map(|(name, value)| schema.field(name).map(|f| (name, &f.field_type, value)))
        .map(|(name, field_type, value)| {
            Ok((name.clone(), encode(schema.name(), name, field_type, value)?))
        })
        .collect()
}

async fn insert_row<C: ConnectionTrait>(
    conn: &C,
    schema: &Schema,
    values: Vec<(String, SqlValue)>,
) -> Result<(), DbErr> {
    let (columns, values): (Vec<_>, Vec<_>) = values.into_iter().unzip();
    let mut stmt = SqlQuery::insert();
    stmt.into_table(Alias::new(schema.name()))
        .columns(columns.iter().map(Alias::new))
        .values(values.into_iter().map(SimpleExpr::from))
        .map_err(|e| DbErr::Custom(e.to_string()))?;
    exec(conn, &stmt).await?;
    Ok(())
}

async fn insert_children<C: ConnectionTrait>(
    conn: &C,
    child: &Schema,
    parent: &str,
    table: &str,
    rows: &[FieldMap],
) -> Result<(), StoreError> {
    for (idx, row) in (0_i64..).zip(rows) {
        let mut values = vec![
            (NAME_COLUMN.to_string(), SqlValue::from(random_name())),
            (PARENT_COLUMN.to_string(), SqlValue::from(parent.to_string())),
            (PARENT_FIELD_COLUMN.to_string(), SqlValue::from(table.to_string())),
            (IDX_COLUMN.to_string(), SqlValue::from(idx)),
        ];
        values.extend(encode_fields(child, row)?);
        insert_row(conn, child, values).await?;
    }
    Ok(())
}

async fn delete_children<C: ConnectionTrait>(
    conn: &C,
    child: &Schema,
    parent: &str,
    table: &str,
) -> Result<(), DbErr> {
    let stmt = SqlQuery::delete()
        .from_table(Alias::new(child.name()))
        .and_where(Expr::col(Alias::new(PARENT_COLUMN)).eq(parent))
        .and_where(Expr::col(Alias::new(PARENT_FIELD_COLUMN)).eq(table))
        .to_owned();
    exec(conn, &stmt).await?;
    Ok(())
}

/// Validates and inserts a new document with its child rows.
pub(crate) async fn create<C: ConnectionTrait>(
    conn: &C,
    schemas: &SchemaSet,
    schema: &Schema,
    input: &DocumentInput,
) -> Result<Document, StoreError> {
    if schema.is_child() {
        return Err(ValidationError::new(
            schema.name(),
            NAME_COLUMN,
            "child rows are created through their parent",
        )
        .into());
    }
    let validated = validate_create(schemas, schema, input)?;
    check_references(conn, schemas, schema, None, &validated.fields).await?;
    check_tables(conn, schemas, schema, &validated.tables).await?;

    let name = assign_name(conn, schema, input, &validated.fields).await?;
    if exists(conn, schema, &name).await? {
        return Err(ValidationError::new(
            schema.name(),
            NAME_COLUMN,
            format!("{name} already exists"),
        )
        .into());
    }

    let mut values = vec![(NAME_COLUMN.to_string(), SqlValue::from(name.clone()))];
    values.extend(encode_fields(schema, &validated.fields)?);
    insert_row(conn, schema, values).await?;
    for (table, rows) in &validated.tables {
        let child = child_schema(schemas, schema, table)?;
        insert_children(conn, child, &name, table, rows).await?;
    }

    debug!(schema = schema.name(), %name, "created document");
    get(conn, schemas, schema, &name).await
}

/// Merges field values into a stored document; a provided table replaces
/// the whole child collection.
pub(crate) async fn update<C: ConnectionTrait>(
    conn: &C,
    schemas: &SchemaSet,
    schema: &Schema,
    name: &str,
    input: &DocumentInput,
) -> Result<Document, StoreError> {
    let existing = get(conn, schemas, schema, name).await?;
    match existing.status {
        DocStatus::Cancelled => {
            return Err(StoreError::immutable(
                schema.name(),
                name,
                "cancelled documents cannot change",
            ));
        }
        DocStatus::Submitted => {
            let locked = input
                .fields
                .keys()
                .chain(input.tables.keys())
                .find(|f| !schema.field(f).is_some_and(|def| def.allow_on_submit));
            if let Some(field) = locked {
                return Err(StoreError::immutable(
                    schema.name(),
                    name,
                    format!("{field} cannot change after submit"),
                ));
            }
        }
        DocStatus::Draft => {}
    }
    if input.name.as_deref().is_some_and(|n| n != name) {
        return Err(
            ValidationError::new(schema.name(), NAME_COLUMN, "documents cannot be renamed").into(),
        );
    }

    let validated = validate_input(schemas, schema, input)?;
    if let Naming::Field(field) = schema.naming()
        && validated
            .fields
            .get(field)
            .is_some_and(|v| v.as_str() != Some(name))
    {
        return Err(ValidationError::new(
            schema.name(),
            field,
            "naming field cannot change",
        )
        .into());
    }

    let mut merged = existing.fields;
    merged.extend(validated.fields.clone());
    check_required(schema, &merged)?;
    check_references(conn, schemas, schema, Some(name), &validated.fields).await?;
    check_tables(conn, schemas, schema, &validated.tables).await?;

    let values = encode_fields(schema, &validated.fields)?;
    if !values.is_empty() {
        let stmt = SqlQuery::update()
            .table(Alias::new(schema.name()))
            .values(
                values
                    .into_iter()
                    .map(|(column, value)| (Alias::new(column), SimpleExpr::from(value))),
            )
            .and_where(Expr::col(Alias::new(NAME_COLUMN)).eq(name))
            .to_owned();
        exec(conn, &stmt).await?;
    }
    for (table, rows) in &validated.tables {
        let child = child_schema(schemas, schema, table)?;
        delete_children(conn, child, name, table).await?;
        insert_children(conn, child, name, table, rows).await?;
    }

    debug!(schema = schema.name(), %name, "updated document");
    get(conn, schemas, schema, name).await
}

/// Deletes a document and its child rows.
///
/// Refused while ledger entries or other documents' links point at it, and
/// for submitted documents.
pub(crate) async fn delete<C: ConnectionTrait>(
    conn: &C,
    schemas: &SchemaSet,
    schema: &Schema,
    name: &str,
) -> Result<(), StoreError> {
    let existing = get(conn, schemas, schema, name).await?;
    let referenced = |referenced_by: String| StoreError::ReferentialIntegrity {
        schema: schema.name().to_string(),
        name: name.to_string(),
        referenced_by,
    };

    if ledger::is_referenced(conn, schema.name(), name).await? {
        return Err(referenced(LEDGER_COLLECTION.to_string()));
    }
    for (other, field) in schemas.links_to(schema.name()) {
        let mut filters = vec![Filter::eq(field.name.clone(), Value::Link(name.to_string()))];
        if other.name() == schema.name() {
            filters.push(Filter::ne(NAME_COLUMN, name));
        }
        if find_key(conn, other, filters).await?.is_some() {
            return Err(referenced(format!("{}.{}", other.name(), field.name)));
        }
    }
    if existing.status == DocStatus::Submitted {
        return Err(StoreError::immutable(
            schema.name(),
            name,
            "submitted documents must be cancelled before deletion",
        ));
    }

    for (table, child_name) in schema.table_fields() {
        delete_children(conn, schemas.get(child_name)?, name, table).await?;
    }
    let stmt = SqlQuery::delete()
        .from_table(Alias::new(schema.name()))
        .and_where(Expr::col(Alias::new(NAME_COLUMN)).eq(name))
        .to_owned();
    exec(conn, &stmt).await?;

    debug!(schema = schema.name(), %name, "deleted document");
    Ok(())
}

/// Persists a lifecycle state.
pub(crate) async fn set_status<C: ConnectionTrait>(
    conn: &C,
    schema: &Schema,
    name: &str,
    status: DocStatus,
) -> Result<(), StoreError> {
    if !schema.submittable() {
        return Err(StoreError::NotSubmittable(schema.name().to_string()));
    }
    let (submitted, cancelled) = status.flags();
    let stmt = SqlQuery::update()
        .table(Alias::new(schema.name()))
        .values([
            (Alias::new(SUBMITTED_COLUMN), SimpleExpr::from(submitted)),
            (Alias::new(CANCELLED_COLUMN), SimpleExpr::from(cancelled)),
        ])
        .and_where(Expr::col(Alias::new(NAME_COLUMN)).eq(name))
        .to_owned();
    if exec(conn, &stmt).await? == 0 {
        return Err(StoreError::not_found(schema.name(), name));
    }
    Ok(())
}
