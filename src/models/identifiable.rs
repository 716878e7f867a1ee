/// Records whose equality is decided by a persistence-assigned identifier.
///
/// Two records are the same when their `id()` values are equal, every other field is ignored.
/// Records that were never persisted (both ids `None`) also compare as the same.
pub trait Identifiable {
    fn id(&self) -> Option<i64>;

    fn same_identity(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.id() == other.id()
    }
}

pub fn identity_eq<T: Identifiable>(lhs: &T, rhs: &T) -> bool {
    lhs.same_identity(rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(Option<i64>, &'static str);

    impl Identifiable for Row {
        fn id(&self) -> Option<i64> {
            self.0
        }
    }

    #[test]
    fn equal_ids_are_the_same_record() {
        assert!(identity_eq(&Row(Some(7), "a"), &Row(Some(7), "b")));
        assert!(!identity_eq(&Row(Some(7), "a"), &Row(Some(8), "a")));
    }

    #[test]
    fn unsaved_rows_compare_equal() {
        assert!(identity_eq(&Row(None, "a"), &Row(None, "b")));
        assert!(!identity_eq(&Row(None, "a"), &Row(Some(1), "a")));
    }
}
