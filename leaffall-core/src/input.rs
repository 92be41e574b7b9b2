use crossbeam_channel::{unbounded, Receiver, Sender};

/// An event from the host environment.
///
/// Pointer timestamps are host seconds (see [`crate::HostClock`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove { x: f32, y: f32, timestamp: f64 },
    PointerLeave,
    Resize { width: f32, height: f32 },
}

/// Writing half of the input queue. Cheap to clone, one per listener.
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: Sender<InputEvent>,
}

impl InputSender {
    /// Queue an event. Returns `false` once the loop has dropped its receiver.
    pub fn send(&self, event: InputEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn pointer_move(&self, x: f32, y: f32, timestamp: f64) -> bool {
        self.send(InputEvent::PointerMove { x, y, timestamp })
    }

    pub fn pointer_leave(&self) -> bool {
        self.send(InputEvent::PointerLeave)
    }

    pub fn resize(&self, width: f32, height: f32) -> bool {
        self.send(InputEvent::Resize { width, height })
    }
}

/// Reading half of the input queue, owned by the loop driver.
///
/// Events are drained at the start of a tick, so everything a tick reads
/// from the pointer was written before the tick began.
#[derive(Debug)]
pub struct InputReceiver {
    rx: Receiver<InputEvent>,
}

impl InputReceiver {
    /// Take every event queued so far, oldest first. Never blocks.
    pub fn drain(&self) -> impl Iterator<Item = InputEvent> + '_ {
        self.rx.try_iter()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

pub fn input_channel() -> (InputSender, InputReceiver) {
    let (tx, rx) = unbounded();
    (InputSender { tx }, InputReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn drain_preserves_order() {
        let (tx, rx) = input_channel();
        tx.pointer_move(1.0, 2.0, 0.5);
        tx.resize(800.0, 600.0);
        tx.pointer_leave();
        assert_eq!(rx.pending(), 3);

        let events: Vec<_> = rx.drain().collect();
        assert_eq!(
            events,
            vec![
                InputEvent::PointerMove { x: 1.0, y: 2.0, timestamp: 0.5 },
                InputEvent::Resize { width: 800.0, height: 600.0 },
                InputEvent::PointerLeave,
            ]
        );
        assert_eq!(rx.drain().count(), 0);
    }

    #[test]
    fn senders_work_across_threads() {
        let (tx, rx) = input_channel();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tx = tx.clone();
                thread::spawn(move || {
                    tx.pointer_move(i as f32, 0.0, i as f64);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(rx.drain().count(), 4);
    }

    #[test]
    fn send_reports_closed_queue() {
        let (tx, rx) = input_channel();
        drop(rx);
        assert!(!tx.pointer_leave());
    }
}
