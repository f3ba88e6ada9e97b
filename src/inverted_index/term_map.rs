use std::collections::HashMap;

pub type CourseID = usize;
pub type TermID = usize;
pub type TF = u32;
pub type TFIDF = f64;

/// Term strings interned in first-seen order, so ids depend only on catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    ids: HashMap<String, TermID>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, term: &str) -> TermID {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.ids.len();
        self.ids.insert(term.to_string(), id);
        id
    }

    pub fn get(&self, term: &str) -> Option<TermID> {
        self.ids.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
