//! Column contracts for the raw snapshots and the cleaned panel.
//!
//! The external pull jobs write whatever dtypes the source database hands
//! back (float manager numbers, nanosecond datetimes, ...). Validation only
//! checks that each required column exists with a dtype of the right family;
//! `prepare` then casts every column to its canonical dtype.

use polars::prelude::*;

/// Column names shared across the crate.
pub mod columns {
    pub const FDATE: &str = "fdate";
    pub const MGRNO: &str = "mgrno";
    pub const MGRNAME: &str = "mgrname";
    pub const TYPECODE: &str = "typecode";
    pub const CUSIP: &str = "cusip";
    pub const SHARES: &str = "shares";
    pub const PRC: &str = "prc";
    pub const SHROUT1: &str = "shrout1";
    pub const STKCD: &str = "stkcd";
    pub const EXCHCD: &str = "exchcd";
    pub const MGRCO: &str = "mgrco";
    pub const MGRCOCD: &str = "mgrcocd";
    pub const PF_NAME: &str = "PF_name";
}

use columns::*;

/// Dtype family a column must belong to before coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Integer,
    Float,
    Text,
    /// Identifier that may arrive as a number or a string.
    Key,
}

impl ColumnKind {
    fn accepts(self, dtype: &DataType) -> bool {
        if matches!(dtype, DataType::Null) {
            return true;
        }
        match self {
            ColumnKind::Date => matches!(dtype, DataType::Date | DataType::Datetime(_, _)),
            ColumnKind::Integer | ColumnKind::Float => is_numeric(dtype),
            ColumnKind::Text => matches!(dtype, DataType::String),
            ColumnKind::Key => is_numeric(dtype) || matches!(dtype, DataType::String),
        }
    }

    fn canonical(self) -> DataType {
        match self {
            ColumnKind::Date => DataType::Date,
            ColumnKind::Integer => DataType::Int64,
            ColumnKind::Float => DataType::Float64,
            ColumnKind::Text | ColumnKind::Key => DataType::String,
        }
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn is_float(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// A required column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn spec(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec { name, kind }
}

/// Holdings Panel: one row per institution x security x quarter.
pub struct HoldingsSchema;

impl HoldingsSchema {
    pub const TABLE: &'static str = "holdings";

    pub const COLUMNS: &'static [ColumnSpec] = &[
        spec(FDATE, ColumnKind::Date),
        spec(MGRNO, ColumnKind::Integer),
        spec(MGRNAME, ColumnKind::Text),
        spec(TYPECODE, ColumnKind::Integer),
        spec(CUSIP, ColumnKind::Text),
        spec(SHARES, ColumnKind::Float),
        spec(PRC, ColumnKind::Float),
        spec(SHROUT1, ColumnKind::Float),
        spec(STKCD, ColumnKind::Key),
        spec(EXCHCD, ColumnKind::Text),
    ];

    pub fn validate(schema: &Schema) -> Result<(), SchemaError> {
        validate_columns(Self::TABLE, Self::COLUMNS, schema)
    }

    /// Validate and cast to canonical dtypes.
    ///
    /// Rows without a manager number cannot form an identity and are
    /// dropped; a missing manager name is treated as the empty name.
    pub fn prepare(mut lf: LazyFrame) -> Result<LazyFrame, SchemaError> {
        let schema = lf.collect_schema().map_err(SchemaError::from_polars)?;
        Self::validate(&schema)?;
        Ok(lf
            .select(coerce_exprs(Self::COLUMNS, &schema))
            .with_column(col(MGRNAME).fill_null(lit("")))
            .filter(col(MGRNO).is_not_null().and(col(FDATE).is_not_null())))
    }
}

/// Fund Registry: (quarter, fund-company identifier) pairs.
pub struct RegistrySchema;

impl RegistrySchema {
    pub const TABLE: &'static str = "fund registry";

    pub const COLUMNS: &'static [ColumnSpec] =
        &[spec(FDATE, ColumnKind::Date), spec(MGRCO, ColumnKind::Key)];

    pub fn validate(schema: &Schema) -> Result<(), SchemaError> {
        validate_columns(Self::TABLE, Self::COLUMNS, schema)
    }

    /// Validate and cast. The pull job names the identifier `mgrcocd`;
    /// that name is accepted as an alias of `mgrco`.
    pub fn prepare(mut lf: LazyFrame) -> Result<LazyFrame, SchemaError> {
        let mut schema = lf.collect_schema().map_err(SchemaError::from_polars)?;
        if !schema.contains(MGRCO) && schema.contains(MGRCOCD) {
            lf = lf.rename([MGRCOCD], [MGRCO], true);
            schema = lf.collect_schema().map_err(SchemaError::from_polars)?;
        }
        Self::validate(&schema)?;
        Ok(lf
            .select(coerce_exprs(Self::COLUMNS, &schema))
            .filter(col(MGRCO).is_not_null().and(col(FDATE).is_not_null())))
    }
}

/// Cleaned Panel produced by the reclassifier. Column order is significant.
pub struct CleanedSchema;

impl CleanedSchema {
    pub const TABLE: &'static str = "cleaned panel";

    pub const COLUMNS: &'static [ColumnSpec] = &[
        spec(FDATE, ColumnKind::Date),
        spec(MGRNO, ColumnKind::Integer),
        spec(MGRNAME, ColumnKind::Text),
        spec(TYPECODE, ColumnKind::Integer),
        spec(CUSIP, ColumnKind::Text),
        spec(SHARES, ColumnKind::Float),
        spec(PRC, ColumnKind::Float),
        spec(SHROUT1, ColumnKind::Float),
    ];

    pub fn names() -> Vec<&'static str> {
        Self::COLUMNS.iter().map(|c| c.name).collect()
    }

    pub fn validate(schema: &Schema) -> Result<(), SchemaError> {
        validate_columns(Self::TABLE, Self::COLUMNS, schema)
    }
}

fn validate_columns(
    table: &'static str,
    expected: &[ColumnSpec],
    actual: &Schema,
) -> Result<(), SchemaError> {
    // Check all required columns exist
    for field in expected {
        if !actual.contains(field.name) {
            return Err(SchemaError::MissingColumn {
                table,
                column: field.name.to_string(),
            });
        }
    }

    // Check dtype families
    for field in expected {
        let actual_dtype = actual.get(field.name).ok_or_else(|| SchemaError::MissingColumn {
            table,
            column: field.name.to_string(),
        })?;
        if !field.kind.accepts(actual_dtype) {
            return Err(SchemaError::TypeMismatch {
                table,
                column: field.name.to_string(),
                expected: field.kind,
                actual: actual_dtype.clone(),
            });
        }
    }

    Ok(())
}

fn coerce_exprs(specs: &[ColumnSpec], schema: &Schema) -> Vec<Expr> {
    specs
        .iter()
        .map(|field| {
            let source = schema.get(field.name);
            let expr = col(field.name);
            // Numeric identifiers stored as floats (e.g. 1234.0) are cast
            // through Int64 so they stringify without a fractional part.
            let expr = match (field.kind, source) {
                (ColumnKind::Key, Some(dtype)) if is_float(dtype) => expr.cast(DataType::Int64),
                _ => expr,
            };
            expr.cast(field.kind.canonical()).alias(field.name)
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{table}: missing required column: {column}")]
    MissingColumn { table: &'static str, column: String },

    #[error("{table}: type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        table: &'static str,
        column: String,
        expected: ColumnKind,
        actual: DataType,
    },

    #[error("schema resolution failed: {0}")]
    Unreadable(String),
}

impl SchemaError {
    fn from_polars(e: PolarsError) -> Self {
        SchemaError::Unreadable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holdings_frame() -> DataFrame {
        let fdate = Series::new(FDATE.into(), &[10_000i32])
            .cast(&DataType::Date)
            .unwrap();
        DataFrame::new(vec![
            Column::from(fdate),
            Column::new(MGRNO.into(), &[100.0f64]),
            Column::new(MGRNAME.into(), &["ALPHA"]),
            Column::new(TYPECODE.into(), &[3.0f64]),
            Column::new(CUSIP.into(), &["00000001"]),
            Column::new(SHARES.into(), &[10.0f64]),
            Column::new(PRC.into(), &[5.0f64]),
            Column::new(SHROUT1.into(), &[1.5f64]),
            Column::new(STKCD.into(), &["0"]),
            Column::new(EXCHCD.into(), &["A"]),
        ])
        .unwrap()
    }

    #[test]
    fn holdings_schema_lists_all_required_columns() {
        let names: Vec<&str> = HoldingsSchema::COLUMNS.iter().map(|c| c.name).collect();
        for required in [
            "fdate", "mgrno", "mgrname", "typecode", "cusip", "shares", "prc", "shrout1",
            "stkcd", "exchcd",
        ] {
            assert!(names.contains(&required), "missing {required}");
        }
    }

    #[test]
    fn prepare_coerces_float_identifiers() {
        let lf = HoldingsSchema::prepare(holdings_frame().lazy()).unwrap();
        let df = lf.collect().unwrap();
        assert_eq!(df.column(MGRNO).unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column(TYPECODE).unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column(MGRNO).unwrap().i64().unwrap().get(0), Some(100));
    }

    #[test]
    fn validate_rejects_missing_column() {
        let df = holdings_frame().drop(PRC).unwrap();
        let err = HoldingsSchema::validate(&df.schema()).unwrap_err();
        match err {
            SchemaError::MissingColumn { column, .. } => assert_eq!(column, "prc"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validate_rejects_wrong_family() {
        let mut df = holdings_frame();
        df.with_column(Column::new(PRC.into(), &["not_a_number"]))
            .unwrap();
        let result = HoldingsSchema::validate(&df.schema());
        assert!(matches!(result, Err(SchemaError::TypeMismatch { .. })));
    }

    #[test]
    fn registry_accepts_mgrcocd_alias() {
        let fdate = Series::new(FDATE.into(), &[10_000i32])
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![
            Column::from(fdate),
            Column::new(MGRCOCD.into(), &[42.0f64]),
        ])
        .unwrap();
        let out = RegistrySchema::prepare(df.lazy()).unwrap().collect().unwrap();
        assert_eq!(out.column(MGRCO).unwrap().str().unwrap().get(0), Some("42"));
    }
}
