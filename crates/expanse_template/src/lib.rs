//! Template expressions for Expanse manifests (Layer 1).
//!
//! Manifest props and action fields may contain `${path}` expressions that
//! are resolved against a [`Scope`] made of three sources:
//!
//! - `context.*`: values supplied by the caller for this render
//! - `state.*`: the mounted surface's state store
//! - `env.*`: host-approved environment values
//!
//! A path whose first segment is none of these reserved names, but is a key
//! of the context, reads from the context directly (`${email.subject}` is
//! shorthand for `${context.email.subject}`).
//!
//! Resolution is total: it never panics and never returns an error. Missing
//! data resolves to `null` for whole-string references and to empty text
//! inside interpolated strings.
//!
//! # Architecture
//!
//! - [`path`]: [`Path`] parsing and lookup, [`Namespace`]
//! - [`template`]: [`Template`] parsing and [`resolve`]
//! - [`scope`]: [`Scope`], the borrowed view over the three sources
//! - [`value`]: [`truthy`] and case-key matching

pub mod path;
pub mod scope;
pub mod template;
pub mod value;

pub use path::{Namespace, Path, PathRoot};
pub use scope::Scope;
pub use template::{
    Segment, Template, contains_template, is_template, resolve, resolve_map, resolve_string,
    stringify,
};
pub use value::{matches_key, truthy};
