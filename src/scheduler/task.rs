/*!
 * Tasks
 * A callback with its arguments bound, runnable exactly once
 */

use std::fmt;

/// Opaque unit of work
///
/// Consumed by [`Task::run`], so a task can never be invoked twice.
pub struct Task {
    job: Box<dyn FnOnce() + Send + 'static>,
}

impl Task {
    /// Create a task from a closure that takes no arguments
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { job: Box::new(f) }
    }

    /// Bind arguments to a callback
    ///
    /// ```
    /// use callback_guard::scheduler::Task;
    /// use std::sync::mpsc;
    ///
    /// let (tx, rx) = mpsc::channel();
    /// let task = Task::bind(move |(a, b): (i32, i32)| tx.send(a + b).unwrap(), (2, 3));
    /// task.run();
    /// assert_eq!(rx.recv().unwrap(), 5);
    /// ```
    pub fn bind<A, F>(f: F, args: A) -> Self
    where
        A: Send + 'static,
        F: FnOnce(A) + Send + 'static,
    {
        Self::new(move || f(args))
    }

    /// Run the task, consuming it
    #[inline]
    pub fn run(self) {
        (self.job)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Task")
    }
}
