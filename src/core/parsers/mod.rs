//! Source parsers for the two supported dialects.
//!
//! - `jsx`: JSX/TSX component markup (uses swc for AST generation)
//! - `template`: `<template>` blocks of single-file components

pub mod jsx;
pub mod template;
