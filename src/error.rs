use thiserror::Error;

use crate::query::lexer::Position;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    // Query language errors
    #[error("Syntax error at {position}: {message}")]
    SyntaxError { message: String, position: Position },

    #[error("Root call \"{0}\" does not exist")]
    UnknownRootCall(String),

    #[error("Root call \"{call}\" requires parameter \"{parameter}\"")]
    MissingParameter { call: String, parameter: String },

    #[error("Invalid parameter \"{parameter}\": {message}")]
    InvalidParameter { parameter: String, message: String },

    // Type errors
    #[error("Type \"{0}\" does not exist")]
    TypeNotFound(String),

    #[error("Type \"{0}\" is not a node")]
    TypeIsNotNode(String),

    #[error("Type \"{0}\" already exists")]
    TypeAlreadyExists(String),

    #[error(
        "Invalid type name \"{0}\". Valid type name may only consist of ASCII letters or numbers"
    )]
    InvalidTypeName(String),

    // Field errors
    #[error("Invalid field name \"{0}\". Field names must be identifiers")]
    InvalidFieldName(String),

    #[error("Invalid field type \"{0}\"")]
    InvalidFieldKind(String),

    #[error("Type \"{type_name}\" already has a field \"{field}\"")]
    FieldAlreadyExists { type_name: String, field: String },

    #[error("Type \"{type_name}\" does not have a field \"{field}\"")]
    FieldNotFound { type_name: String, field: String },

    #[error("Field \"{field}\" of \"{type_name}\" is a built-in")]
    FieldIsBuiltIn { type_name: String, field: String },

    #[error("Field \"{field}\" of \"{type_name}\" is a connection")]
    FieldIsConnection { type_name: String, field: String },

    #[error("Field \"{field}\" of \"{type_name}\" is not a connection")]
    FieldIsNotConnection { type_name: String, field: String },

    // Index errors
    #[error("Type \"{type_name}\" already has an index \"{index}\"")]
    IndexAlreadyExists { type_name: String, index: String },

    #[error("Type \"{type_name}\" does not have an index \"{index}\"")]
    IndexNotFound { type_name: String, index: String },

    #[error("Index \"{index}\" of \"{type_name}\" is a built-in")]
    IndexIsBuiltIn { type_name: String, index: String },

    // Record data errors
    #[error("Type \"{type_name}\" does not have a field \"{field}\"")]
    UnknownField { type_name: String, field: String },

    #[error("Type \"{type_name}\" has missing required field \"{field}\"")]
    MissingRequiredField { type_name: String, field: String },

    #[error("Can not convert {value} to {kind}")]
    ValueConversionError { value: String, kind: String },

    #[error("Record \"{id}\" of type \"{type_name}\" not found")]
    RecordNotFound { type_name: String, id: String },

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Stable name of the error kind, for transport layers that render errors.
    pub fn kind(&self) -> &'static str {
        match self {
            DbError::SyntaxError { .. } => "SyntaxError",
            DbError::UnknownRootCall(_) => "UnknownRootCall",
            DbError::MissingParameter { .. } => "MissingParameter",
            DbError::InvalidParameter { .. } => "InvalidParameter",
            DbError::TypeNotFound(_) => "TypeNotFound",
            DbError::TypeIsNotNode(_) => "TypeIsNotNode",
            DbError::TypeAlreadyExists(_) => "TypeAlreadyExists",
            DbError::InvalidTypeName(_) => "InvalidTypeName",
            DbError::InvalidFieldName(_) => "InvalidFieldName",
            DbError::InvalidFieldKind(_) => "InvalidFieldKind",
            DbError::FieldAlreadyExists { .. } => "FieldAlreadyExists",
            DbError::FieldNotFound { .. } => "FieldNotFound",
            DbError::FieldIsBuiltIn { .. } => "FieldIsBuiltIn",
            DbError::FieldIsConnection { .. } => "FieldIsConnection",
            DbError::FieldIsNotConnection { .. } => "FieldIsNotConnection",
            DbError::IndexAlreadyExists { .. } => "IndexAlreadyExists",
            DbError::IndexNotFound { .. } => "IndexNotFound",
            DbError::IndexIsBuiltIn { .. } => "IndexIsBuiltIn",
            DbError::UnknownField { .. } => "UnknownField",
            DbError::MissingRequiredField { .. } => "MissingRequiredField",
            DbError::ValueConversionError { .. } => "ValueConversionError",
            DbError::RecordNotFound { .. } => "RecordNotFound",
            DbError::InternalError(_) => "InternalError",
        }
    }

    pub(crate) fn syntax(message: impl Into<String>, position: Position) -> Self {
        DbError::SyntaxError {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn invalid_parameter(parameter: &str, message: impl Into<String>) -> Self {
        DbError::InvalidParameter {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }
}

impl serde::Serialize for DbError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
