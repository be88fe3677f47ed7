// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `Error` struct and the `ErrorKind` enum, which are
//! used to represent errors that can occur in the library.

/// A macro for defining the `ErrorKind` enum, the `Display` implementation for
/// it, and the constructors for the `Error` struct.
macro_rules! ErrorKind {
    ($(
        ($kind:ident, $ctor:ident)
    ),*) => {
        /// The kind of error that occurred.
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub enum ErrorKind {
            $(
                $kind,
            )*
        }

        impl std::fmt::Display for ErrorKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$kind => write!(f, "{}", stringify!($kind)),
                    )*
                }
            }
        }

        /// Constructors for [`Error`].
        impl Error {
            $(
                #[doc = concat!(
                    "Creates a new [`Error`] with the `",
                    stringify!($kind),
                    "` kind and the given description."
                )]
                pub(crate) fn $ctor(desc: impl Into<String>) -> crate::Error {
                    Self {
                        kind: ErrorKind::$kind,
                        desc: desc.into(),
                    }
                }
            )*
        }
    };
}

ErrorKind!(
    (ComponentNotFound, component_not_found),
    (ContractViolation, contract_violation),
    (FlowSideConflict, flow_side_conflict),
    (Internal, internal),
    (InvalidComponent, invalid_component),
    (InvalidConnection, invalid_connection),
    (InvalidGraph, invalid_graph),
    (OddPartition, odd_partition),
    (PortNotFound, port_not_found),
    (Serialization, serialization),
    (TypeMismatch, type_mismatch)
);

/// An error that can occur during the creation, querying or rewriting of a
/// [TopologyGraph][crate::TopologyGraph].
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    desc: String,
}

impl Error {
    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the description of the error.
    pub fn description(&self) -> &str {
        &self.desc
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.desc)
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::odd_partition("Distributor:4 has 3 loose ends.");
        assert_eq!(err.kind(), ErrorKind::OddPartition);
        assert_eq!(
            err.to_string(),
            "OddPartition: Distributor:4 has 3 loose ends."
        );
    }

    #[test]
    fn test_from_json_error() {
        let Err(err) = serde_json::from_str::<u64>("not json") else {
            panic!()
        };
        let err = Error::from(err);
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }
}
