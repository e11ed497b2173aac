//! Publish/subscribe signal with explicit disconnect tokens.
//!
//! The viewport core never hands out callbacks that outlive the content they
//! were registered for: every connection returns a [`Token`] and the owner is
//! responsible for disconnecting it before the content it refers to is
//! replaced.

/// Opaque handle identifying one connection to a [`Signal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(u64);

pub struct Signal<T> {
    slots: Vec<(Token, Box<dyn FnMut(&T)>)>,
    next_id: u64,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler and return the token needed to disconnect it.
    pub fn connect(&mut self, handler: impl FnMut(&T) + 'static) -> Token {
        let token = Token(self.next_id);
        self.next_id += 1;
        self.slots.push((token, Box::new(handler)));
        token
    }

    /// Remove a previously registered handler. Returns false if the token
    /// was already disconnected.
    pub fn disconnect(&mut self, token: Token) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(t, _)| *t != token);
        before != self.slots.len()
    }

    pub fn emit(&mut self, value: &T) {
        for (_, handler) in &mut self.slots {
            handler(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("slots", &self.slots.len()).finish()
    }
}
