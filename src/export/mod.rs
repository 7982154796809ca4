//! The recap export engine: template duplication and fill-in, retention
//! sweeping, source-sheet access, and the pair orchestration on top.
pub(crate) mod pair;
pub(crate) mod retention;
pub(crate) mod source;
pub(crate) mod survey;
pub(crate) mod template;
pub(crate) mod title;
