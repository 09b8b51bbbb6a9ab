use crate::strings::StringPool;

#[test]
fn append_and_get() {
    let mut pool = StringPool::new();
    pool.append(b"abc");
    pool.append(b"def");
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.width(), 3);
    assert_eq!(pool.get(0), b"abc");
    assert_eq!(pool.get(1), b"def");
}

#[test]
fn find_on_sorted_entries() {
    let pool = StringPool::from_sorted([b"bar".as_slice(), b"baz", b"foo", b"qux"]);
    assert_eq!(pool.find(b"bar"), Some(0));
    assert_eq!(pool.find(b"baz"), Some(1));
    assert_eq!(pool.find(b"foo"), Some(2));
    assert_eq!(pool.find(b"qux"), Some(3));
    assert_eq!(pool.find(b"aaa"), None);
    assert_eq!(pool.find(b"boo"), None);
    assert_eq!(pool.find(b"zzz"), None);
}

#[test]
fn find_rejects_other_widths() {
    let pool = StringPool::from_sorted([b"ab".as_slice(), b"cd"]);
    assert_eq!(pool.find(b"abc"), None);
    assert_eq!(pool.find(b""), None);
}

#[test]
fn empty_pool() {
    let pool = StringPool::new();
    assert!(pool.is_empty());
    assert_eq!(pool.find(b""), None);
    assert_eq!(pool.iter().count(), 0);
}

#[test]
fn zero_width_entries() {
    let mut pool = StringPool::new();
    pool.append(b"");
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.width(), 0);
    assert_eq!(pool.get(0), b"");
    assert_eq!(pool.find(b""), Some(0));
}
