/// Activation list with one "active item" shared by keyboard and pointer.
///
/// The first item is active as soon as the list exists. Steps clamp at the
/// ends instead of wrapping.
#[derive(Debug, Clone)]
pub struct ActiveList<T> {
    items: Vec<T>,
    active: usize,
}

impl<T> ActiveList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, active: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn active(&self) -> Option<usize> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.active)
        }
    }

    pub fn active_item(&self) -> Option<&T> {
        self.items.get(self.active)
    }

    pub fn step(&mut self, delta: i32) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        let magnitude = delta.unsigned_abs() as usize;
        self.active = if delta < 0 {
            self.active.saturating_sub(magnitude)
        } else {
            self.active.saturating_add(magnitude).min(last)
        };
    }

    /// Pointer hover; out-of-range indices are ignored.
    pub fn hover(&mut self, index: usize) {
        if index < self.items.len() {
            self.active = index;
        }
    }

    pub fn activate(&self) -> Option<&T> {
        self.active_item()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_item_is_active_on_creation() {
        let list = ActiveList::new(vec!["clone", "print", "delete"]);
        assert_eq!(list.active(), Some(0));
        assert_eq!(list.activate(), Some(&"clone"));
    }

    #[test]
    fn steps_clamp_at_both_ends() {
        let mut list = ActiveList::new(vec![1, 2, 3]);
        list.step(-1);
        assert_eq!(list.active(), Some(0));
        list.step(1);
        list.step(1);
        list.step(1);
        assert_eq!(list.active(), Some(2));
        list.step(-5);
        assert_eq!(list.active(), Some(0));
    }

    #[test]
    fn hover_and_keyboard_share_the_active_item() {
        let mut list = ActiveList::new(vec!['a', 'b', 'c']);
        list.hover(2);
        assert_eq!(list.activate(), Some(&'c'));
        list.step(-1);
        assert_eq!(list.activate(), Some(&'b'));
        list.hover(9);
        assert_eq!(list.active(), Some(1));
    }

    #[test]
    fn empty_list_has_no_active_item() {
        let mut list: ActiveList<u8> = ActiveList::new(Vec::new());
        list.step(1);
        assert_eq!(list.active(), None);
        assert!(list.activate().is_none());
    }
}
