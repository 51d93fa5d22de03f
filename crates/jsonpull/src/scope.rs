use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

/// Nesting ceiling; exceeding it is a structural error.
pub(crate) const MAX_DEPTH: usize = 256;

/// Where in the document the reader currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// No top-level value has been read yet.
    EmptyDocument,
    /// A top-level value has been read.
    NonemptyDocument,
    /// Inside `{`, before any name.
    EmptyObject,
    /// Inside an object, after a completed name/value pair.
    NonemptyObject,
    /// A name has been read and its value is pending.
    DanglingName,
    /// Inside `[`, before any element.
    EmptyArray,
    /// Inside an array, after at least one element.
    NonemptyArray,
    /// A raw value sub-stream from `next_source` owns the byte stream.
    StreamingValue,
    /// The reader is closed. Terminal.
    Closed,
}

/// The scope stack plus the parallel path slots that feed `get_path()`.
///
/// Every frame owns one name slot (object scopes) and one index slot (array
/// scopes); pushing a scope reserves both.
#[derive(Debug, Clone)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
    path_names: Vec<Option<String>>,
    path_indices: Vec<usize>,
}

impl ScopeStack {
    pub(crate) fn new() -> Self {
        let mut stack = Self {
            scopes: Vec::new(),
            path_names: Vec::new(),
            path_indices: Vec::new(),
        };
        let pushed = stack.push(Scope::EmptyDocument);
        debug_assert!(pushed);
        stack
    }

    /// Pushes a frame. Returns `false` when the ceiling is hit.
    pub(crate) fn push(&mut self, scope: Scope) -> bool {
        if self.scopes.len() == MAX_DEPTH {
            return false;
        }
        self.scopes.push(scope);
        self.path_names.push(None);
        self.path_indices.push(0);
        true
    }

    pub(crate) fn pop(&mut self) {
        self.scopes.pop();
        self.path_names.pop();
        self.path_indices.pop();
    }

    pub(crate) fn top(&self) -> Scope {
        // The stack is never empty: construction seeds the document frame and
        // close() replaces the whole stack with a single Closed frame.
        self.scopes.last().copied().unwrap_or(Scope::Closed)
    }

    pub(crate) fn replace_top(&mut self, scope: Scope) {
        if let Some(top) = self.scopes.last_mut() {
            *top = scope;
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        if let Some(slot) = self.path_names.last_mut() {
            *slot = Some(name);
        }
    }

    pub(crate) fn restore_name(&mut self, name: Option<String>) {
        if let Some(slot) = self.path_names.last_mut() {
            *slot = name;
        }
    }

    pub(crate) fn name(&self) -> Option<String> {
        self.path_names.last().cloned().flatten()
    }

    pub(crate) fn bump_index(&mut self) {
        if let Some(slot) = self.path_indices.last_mut() {
            *slot += 1;
        }
    }

    pub(crate) fn unbump_index(&mut self) {
        if let Some(slot) = self.path_indices.last_mut() {
            *slot = slot.saturating_sub(1);
        }
    }

    /// Replaces everything with the terminal Closed frame.
    pub(crate) fn close(&mut self) {
        self.scopes.clear();
        self.path_names.clear();
        self.path_indices.clear();
        let pushed = self.push(Scope::Closed);
        debug_assert!(pushed);
    }

    /// Renders the current position as a JSONPath, e.g. `$.users[2].name`.
    ///
    /// Object frames contribute `.name` (just `.` while the name is unread;
    /// `skip_name` stamps the literal `null`), array frames `[index]`.
    pub(crate) fn render_path(&self) -> String {
        let mut out = String::from("$");
        for (i, scope) in self.scopes.iter().enumerate() {
            match scope {
                Scope::EmptyArray | Scope::NonemptyArray => {
                    let _ = write!(out, "[{}]", self.path_indices[i]);
                }
                Scope::EmptyObject | Scope::DanglingName | Scope::NonemptyObject => {
                    out.push('.');
                    if let Some(name) = &self.path_names[i] {
                        out.push_str(name);
                    }
                }
                Scope::EmptyDocument
                | Scope::NonemptyDocument
                | Scope::StreamingValue
                | Scope::Closed => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn path_renders_objects_and_arrays() {
        let mut stack = ScopeStack::new();
        assert_eq!(stack.render_path(), "$");

        stack.push(Scope::EmptyObject);
        stack.set_name("users".to_string());
        stack.push(Scope::EmptyArray);
        stack.bump_index();
        stack.bump_index();
        stack.push(Scope::NonemptyObject);
        stack.set_name("name".to_string());
        assert_eq!(stack.render_path(), "$.users[2].name");

        stack.pop();
        stack.pop();
        assert_eq!(stack.render_path(), "$.users");
    }

    #[test]
    fn unread_name_renders_bare_dot() {
        let mut stack = ScopeStack::new();
        stack.push(Scope::EmptyObject);
        assert_eq!(stack.render_path(), "$.");
    }

    #[test]
    fn push_refuses_past_ceiling() {
        let mut stack = ScopeStack::new();
        for _ in 0..MAX_DEPTH - 1 {
            assert!(stack.push(Scope::EmptyArray));
        }
        assert!(!stack.push(Scope::EmptyArray));
    }

    #[test]
    fn close_is_terminal() {
        let mut stack = ScopeStack::new();
        stack.push(Scope::EmptyObject);
        stack.close();
        assert_eq!(stack.top(), Scope::Closed);
        assert_eq!(stack.render_path(), "$");
    }
}
