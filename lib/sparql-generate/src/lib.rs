#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod engine;
pub mod error;

pub use engine::{PreparedQuery, RunningGeneration, SparqlGenerate};

pub mod model {
    pub use sparql_generate_model::*;
}

pub mod algebra {
    pub use spargebra::algebra::*;
}

pub mod common {
    pub use sparql_generate_common::*;
}

pub mod functions {
    pub use sparql_generate_functions::*;
}

pub mod logical {
    pub use sparql_generate_logical::*;
}

pub mod execution {
    pub use sparql_generate_execution::*;
}
