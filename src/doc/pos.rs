use std::cmp::Ordering;

/// A caret resolved against a document: the path of child indices leading to a
/// text-bearing block, plus a character offset inside that block's text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Caret {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Caret {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// Anchor/head selection. Collapsed when both carets are equal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Selection {
    pub anchor: Caret,
    pub head: Caret,
}

impl Selection {
    pub fn collapsed(caret: Caret) -> Self {
        Self {
            anchor: caret.clone(),
            head: caret,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// (start, end) in document order.
    pub fn ordered(&self) -> (Caret, Caret) {
        if cmp_caret(&self.anchor, &self.head) == Ordering::Greater {
            (self.head.clone(), self.anchor.clone())
        } else {
            (self.anchor.clone(), self.head.clone())
        }
    }
}

/// Document order. Text blocks are leaves, so no caret path is a strict prefix
/// of another; plain lexicographic comparison is sufficient.
pub(crate) fn cmp_caret(a: &Caret, b: &Caret) -> Ordering {
    a.path.cmp(&b.path).then(a.offset.cmp(&b.offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_order_is_document_order() {
        let a = Caret::new(vec![0], 3);
        let b = Caret::new(vec![1], 0);
        let c = Caret::new(vec![1], 2);
        assert_eq!(cmp_caret(&a, &b), Ordering::Less);
        assert_eq!(cmp_caret(&b, &c), Ordering::Less);
        assert_eq!(cmp_caret(&c, &c), Ordering::Equal);
    }

    #[test]
    fn test_selection_ordered_swaps_backward_range() {
        let sel = Selection {
            anchor: Caret::new(vec![2], 5),
            head: Caret::new(vec![0], 1),
        };
        let (start, end) = sel.ordered();
        assert_eq!(start.path, vec![0]);
        assert_eq!(end.path, vec![2]);
        assert!(!sel.is_collapsed());
    }
}
