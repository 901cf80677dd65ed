//! System-wide hotkeys through the `global-hotkey` crate
//!
//! The `GlobalHotKeyManager` lives on its own thread for its whole life.
//! On Windows that thread also pumps the message queue the manager's hidden
//! window receives `WM_HOTKEY` on. Register and unregister requests reach it
//! over a channel. Presses arrive on a second listener thread, which
//! dispatches into the shared [`HotkeyTable`] while the UI keeps running.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

use crate::system::error::{HotkeyError, HotkeyResult};

use super::{HotkeyBackend, HotkeyTable, KeyCombination};

type Reply = Sender<Result<(), String>>;

/// Work for the manager thread
enum Request {
    Register(HotKey, Reply),
    Unregister(HotKey, Reply),
}

fn handle(manager: &GlobalHotKeyManager, request: Request) {
    let (result, reply) = match request {
        Request::Register(hotkey, reply) => (manager.register(hotkey), reply),
        Request::Unregister(hotkey, reply) => (manager.unregister(hotkey), reply),
    };
    // The caller waits for this; it only goes away if the UI is exiting
    let _ = reply.send(result.map_err(|e| e.to_string()));
}

#[cfg(windows)]
fn serve(manager: GlobalHotKeyManager, requests: Receiver<Request>) {
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Duration;

    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE,
    };

    const PUMP_INTERVAL: Duration = Duration::from_millis(15);

    loop {
        let mut msg = MSG::default();
        // SAFETY: msg is a valid, writable MSG; only this thread's queue is read.
        unsafe {
            while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }

        match requests.recv_timeout(PUMP_INTERVAL) {
            Ok(request) => handle(&manager, request),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(not(windows))]
fn serve(manager: GlobalHotKeyManager, requests: Receiver<Request>) {
    while let Ok(request) = requests.recv() {
        handle(&manager, request);
    }
}

#[cfg(target_os = "macos")]
fn check_platform() -> Result<(), String> {
    Err("macOS delivers global hotkeys only to the main thread's event loop".to_string())
}

#[cfg(all(unix, not(target_os = "macos")))]
fn check_platform() -> Result<(), String> {
    // The X11 backend cannot cope with a missing display
    match std::env::var_os("DISPLAY") {
        Some(display) if !display.is_empty() => Ok(()),
        _ => Err("no X11 display (DISPLAY is not set)".to_string()),
    }
}

#[cfg(windows)]
fn check_platform() -> Result<(), String> {
    Ok(())
}

/// Registers combinations with the desktop session.
pub struct GlobalBackend {
    requests: Sender<Request>,
    ids: Arc<Mutex<HashMap<u32, KeyCombination>>>,
    active: HashMap<KeyCombination, HotKey>,
}

impl GlobalBackend {
    /// Connects to the desktop session and starts the manager and listener
    /// threads.
    ///
    /// # Returns
    /// * `Err(String)` - No hotkey service is available (e.g. no display,
    ///   or a platform that needs the main thread)
    pub fn start(table: Arc<HotkeyTable>) -> Result<Self, String> {
        check_platform()?;

        let (requests, request_rx) = mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("hotkey-manager".to_string())
            .spawn(move || match GlobalHotKeyManager::new() {
                Ok(manager) => {
                    let _ = ready_tx.send(Ok(()));
                    serve(manager, request_rx);
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err.to_string()));
                }
            })
            .map_err(|e| e.to_string())?;

        ready_rx
            .recv()
            .map_err(|_| "hotkey manager thread exited".to_string())??;

        let ids: Arc<Mutex<HashMap<u32, KeyCombination>>> = Arc::default();
        let listener_ids = Arc::clone(&ids);
        thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || {
                let receiver = GlobalHotKeyEvent::receiver();
                while let Ok(event) = receiver.recv() {
                    if event.state != HotKeyState::Pressed {
                        continue;
                    }
                    let key = listener_ids
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .get(&event.id)
                        .copied();
                    if let Some(key) = key {
                        table.dispatch(&key);
                    }
                }
            })
            .map_err(|e| e.to_string())?;

        tracing::info!("global hotkeys ready");
        Ok(Self {
            requests,
            ids,
            active: HashMap::new(),
        })
    }

    /// Runs one request on the manager thread and waits for its result.
    fn call(&self, request: impl FnOnce(Reply) -> Request) -> Result<(), String> {
        let stopped = || "hotkey manager thread stopped".to_string();
        let (reply_tx, reply_rx) = mpsc::channel();
        self.requests
            .send(request(reply_tx))
            .map_err(|_| stopped())?;
        reply_rx.recv().map_err(|_| stopped())?
    }
}

impl HotkeyBackend for GlobalBackend {
    fn name(&self) -> &'static str {
        "global"
    }

    fn activate(&mut self, key: &KeyCombination) -> HotkeyResult<()> {
        let backend_error = |message: String| HotkeyError::Backend { key: *key, message };

        let hotkey: HotKey = key
            .to_string()
            .parse()
            .map_err(|e: global_hotkey::hotkey::HotKeyParseError| backend_error(e.to_string()))?;
        self.call(|reply| Request::Register(hotkey, reply))
            .map_err(backend_error)?;

        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hotkey.id(), *key);
        self.active.insert(*key, hotkey);
        Ok(())
    }

    fn deactivate(&mut self, key: &KeyCombination) -> HotkeyResult<()> {
        let Some(hotkey) = self.active.remove(key) else {
            return Err(HotkeyError::NotRegistered(*key));
        };

        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&hotkey.id());
        self.call(|reply| Request::Unregister(hotkey, reply))
            .map_err(|message| HotkeyError::Backend { key: *key, message })
    }
}
