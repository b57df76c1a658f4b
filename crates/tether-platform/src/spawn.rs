//! Task spawning on the browser microtask queue.

use futures::future::LocalFutureObj;
use futures::task::{LocalSpawn, SpawnError};

/// [`LocalSpawn`] over `wasm_bindgen_futures::spawn_local`. Spawning never
/// fails; a task runs until it completes or its abort handle fires.
#[derive(Debug, Default, Clone, Copy)]
pub struct WasmSpawner;

impl WasmSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}
