//! Cross-crate tests for the obscura workspace, organized by component.

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod mapping;
#[cfg(test)]
mod rename;
