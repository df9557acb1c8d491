//! Vocabulary shared between the interaction core and its host applications.

pub mod domain;
pub mod error;
pub mod protocol;
