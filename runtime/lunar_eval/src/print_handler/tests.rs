use super::*;

#[test]
fn buffer_handler_println_appends_newline() {
    let handler = BufferPrintHandler::new();
    handler.println("hello");
    handler.println("world");
    assert_eq!(handler.get_output(), "hello\nworld\n");
}

#[test]
fn buffer_handler_clear_empties_buffer() {
    let handler = buffer_handler();
    handler.println("hello");
    assert!(!handler.get_output().is_empty());
    handler.clear();
    assert!(handler.get_output().is_empty());
}

#[test]
fn stdout_handler_captures_nothing() {
    let handler = stdout_handler();
    handler.clear();
    assert_eq!(handler.get_output(), "");
}

#[test]
fn silent_handler_discards_output() {
    let handler = silent_handler();
    handler.println("hello");
    assert_eq!(handler.get_output(), "");
}

#[test]
fn buffer_handler_is_thread_safe() {
    let handler = buffer_handler();
    let other = handler.clone();

    let worker = std::thread::spawn(move || {
        for _ in 0..100 {
            other.println("a");
        }
    });
    for _ in 0..100 {
        handler.println("b");
    }
    assert!(worker.join().is_ok());

    assert_eq!(handler.get_output().lines().count(), 200);
}
