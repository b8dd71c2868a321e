//! Domain layer modules
//!
//! This module contains business domain logic:
//! - `template`: Template records and the stores that hold them
//! - `render`: Variable substitution into subject and body text
//! - `provider`: Delivery through external email services
//! - `dispatch`: The send pipeline tying the three together

pub mod dispatch;
pub mod provider;
pub mod render;
pub mod template;
