//! Request handlers grouped by protocol domain.
//! - dom: document tree, disclosure, highlight overlay, inspect mode
//! - css: stylesheet ids, matched/computed/inline styles, text edits
//! - page: navigation, reload, cookies, navigation reset
//! - runtime: execution context, evaluation, property listing
//! - debugger: enable/disable, breakpoints, run control, script source

mod css;
mod debugger;
mod dom;
mod page;
mod runtime;
