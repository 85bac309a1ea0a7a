//! Provider response types → crate result types.

use aws_sdk_redshiftdata::operation::describe_statement::DescribeStatementOutput;
use aws_sdk_redshiftdata::operation::get_statement_result::GetStatementResultOutput;
use aws_sdk_redshiftdata::primitives::DateTime as SdkDateTime;
use aws_sdk_redshiftdata::types::{
    ColumnMetadata as SdkColumnMetadata, Field as SdkField, SubStatementData,
};
use chrono::{DateTime, Utc};
use tracing::warn;

use redshift_data_core::error::Result;
use redshift_data_core::{RedshiftDataError, StatementDescription, StatementStatus, SubStatement};

use crate::result::{ColumnMetadata, Field, ResultPage};

/// Parse a provider status string. A missing status is treated as SUBMITTED.
pub fn status_from_str(raw: Option<&str>) -> Result<StatementStatus> {
    match raw {
        Some(s) => s.parse(),
        None => Ok(StatementStatus::Submitted),
    }
}

pub fn description_from_sdk(output: &DescribeStatementOutput) -> Result<StatementDescription> {
    let sub_statements = output
        .sub_statements()
        .iter()
        .map(sub_statement_from_sdk)
        .collect::<Result<Vec<_>>>()?;

    Ok(StatementDescription {
        id: output.id().into(),
        status: status_from_str(output.status().map(|s| s.as_str()))?,
        error: output.error().map(str::to_string),
        query_string: output.query_string().map(str::to_string),
        has_result_set: output.has_result_set().unwrap_or(false),
        result_rows: output.result_rows(),
        result_size: output.result_size(),
        duration_ns: output.duration(),
        redshift_query_id: output.redshift_query_id(),
        created_at: output.created_at().and_then(timestamp_from_sdk),
        updated_at: output.updated_at().and_then(timestamp_from_sdk),
        sub_statements,
    })
}

fn sub_statement_from_sdk(sub: &SubStatementData) -> Result<SubStatement> {
    Ok(SubStatement {
        id: sub.id().into(),
        status: status_from_str(sub.status().map(|s| s.as_str()))?,
        query_string: sub.query_string().map(str::to_string),
        error: sub.error().map(str::to_string),
        has_result_set: sub.has_result_set().unwrap_or(false),
        result_rows: sub.result_rows(),
    })
}

pub fn page_from_sdk(output: &GetStatementResultOutput) -> Result<ResultPage> {
    let records = output
        .records()
        .iter()
        .enumerate()
        .map(|(row, fields)| {
            fields
                .iter()
                .enumerate()
                .map(|(column, field)| {
                    field_from_sdk(field).ok_or_else(|| unrecognised_field(row, column))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ResultPage {
        columns: output.column_metadata().iter().map(column_from_sdk).collect(),
        records,
        total_num_rows: output.total_num_rows(),
        next_token: output.next_token().map(str::to_string),
    })
}

pub fn column_from_sdk(column: &SdkColumnMetadata) -> ColumnMetadata {
    let name = column.name().unwrap_or_default().to_string();
    let label = column
        .label()
        .filter(|label| *label != name)
        .map(str::to_string);
    ColumnMetadata {
        name,
        type_name: column.type_name().unwrap_or_default().to_string(),
        label,
        // JDBC convention: 0 = no nulls, 1 = nullable, 2 = unknown.
        nullable: column.nullable() != 0,
    }
}

/// `None` for union variants this SDK version does not know.
pub fn field_from_sdk(field: &SdkField) -> Option<Field> {
    match field {
        SdkField::IsNull(_) => Some(Field::Null),
        SdkField::BooleanValue(b) => Some(Field::Boolean(*b)),
        SdkField::LongValue(v) => Some(Field::Long(*v)),
        SdkField::DoubleValue(v) => Some(Field::Double(*v)),
        SdkField::StringValue(s) => Some(Field::String(s.clone())),
        SdkField::BlobValue(blob) => Some(Field::Blob(blob.as_ref().to_vec())),
        _ => None,
    }
}

fn unrecognised_field(row: usize, column: usize) -> RedshiftDataError {
    warn!(row, column, "Unrecognised result field variant");
    RedshiftDataError::Provider(format!(
        "unrecognised field type at row {}, column {}; the SDK may need upgrading",
        row + 1,
        column + 1
    ))
}

fn timestamp_from_sdk(ts: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}
