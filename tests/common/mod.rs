//! Mock Proxy-Wasm host for end-to-end tests
//!
//! Keeps host state in a shared `MockState` so a test can both drive the
//! guest exports and inspect what the guest asked the host to do.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use veil_wasm_sdk::hostcall::{set_host_emulator, HostEmulator, HostResult};
use veil_wasm_sdk::{map, Status};

/// An HTTP callout as the host received it
#[derive(Debug, Clone, PartialEq)]
pub struct Callout {
    pub upstream: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub trailers: Vec<(String, String)>,
    pub timeout_ms: u32,
}

/// A local response sent with `proxy_send_local_response`
#[derive(Debug, Clone, PartialEq)]
pub struct LocalResponse {
    pub status_code: u32,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

pub struct MockState {
    pub configuration: Option<Vec<u8>>,
    pub properties: HashMap<Vec<u8>, Vec<u8>>,
    /// map type -> pairs, in insertion order
    pub maps: HashMap<u32, Vec<(String, String)>>,
    /// map type -> payload served verbatim, ahead of `maps`
    pub raw_maps: HashMap<u32, Vec<u8>>,
    /// buffer type -> contents; `None` answers `Ok` with a null pointer
    pub buffers: HashMap<u32, Option<Vec<u8>>>,
    /// key -> (value, cas)
    pub shared: HashMap<Vec<u8>, (Vec<u8>, u32)>,
    pub queue_names: HashMap<Vec<u8>, u32>,
    pub queues: HashMap<u32, VecDeque<Vec<u8>>>,
    pub next_callout_id: u32,
    pub callouts: Vec<Callout>,
    pub effective_contexts: Vec<u32>,
    pub tick_period_ms: Option<u32>,
    pub now_nanos: u64,
    pub logs: Vec<(u32, String)>,
    pub local_responses: Vec<LocalResponse>,
    pub continued_requests: usize,
    pub continued_responses: usize,
    pub done_calls: usize,
    next_cas: u32,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            configuration: None,
            properties: HashMap::new(),
            maps: HashMap::new(),
            raw_maps: HashMap::new(),
            buffers: HashMap::new(),
            shared: HashMap::new(),
            queue_names: HashMap::new(),
            queues: HashMap::new(),
            next_callout_id: 42,
            callouts: Vec::new(),
            effective_contexts: Vec::new(),
            tick_period_ms: None,
            now_nanos: 1_700_000_000_000_000_000,
            logs: Vec::new(),
            local_responses: Vec::new(),
            continued_requests: 0,
            continued_responses: 0,
            done_calls: 0,
            next_cas: 1,
        }
    }
}

impl MockState {
    pub fn set_map(&mut self, map_type: u32, pairs: &[(&str, &str)]) {
        let pairs = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.maps.insert(map_type, pairs);
    }

    pub fn map(&self, map_type: u32) -> Vec<(String, String)> {
        self.maps.get(&map_type).cloned().unwrap_or_default()
    }

    fn decode(data: &[u8]) -> Vec<(String, String)> {
        if data.is_empty() {
            return Vec::new();
        }
        map::decode(data).expect("guest sent a malformed map")
    }
}

pub struct MockHost {
    state: Rc<RefCell<MockState>>,
}

/// Install a fresh mock host on the current thread
pub fn install() -> Rc<RefCell<MockState>> {
    let state = Rc::new(RefCell::new(MockState::default()));
    set_host_emulator(Box::new(MockHost {
        state: state.clone(),
    }));
    state
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl HostEmulator for MockHost {
    fn log(&mut self, level: u32, message: &str) -> Status {
        self.state.borrow_mut().logs.push((level, message.to_string()));
        Status::Ok
    }

    fn get_configuration(&mut self) -> HostResult<Option<Vec<u8>>> {
        Ok(self.state.borrow().configuration.clone())
    }

    fn set_property(&mut self, path: &[u8], value: &[u8]) -> Status {
        self.state
            .borrow_mut()
            .properties
            .insert(path.to_vec(), value.to_vec());
        Status::Ok
    }

    fn get_property(&mut self, path: &[u8]) -> HostResult<Option<Vec<u8>>> {
        match self.state.borrow().properties.get(path) {
            Some(value) => Ok(Some(value.clone())),
            None => Err(Status::NotFound),
        }
    }

    fn continue_request(&mut self) -> Status {
        self.state.borrow_mut().continued_requests += 1;
        Status::Ok
    }

    fn continue_response(&mut self) -> Status {
        self.state.borrow_mut().continued_responses += 1;
        Status::Ok
    }

    fn send_local_response(
        &mut self,
        status_code: u32,
        _details: &[u8],
        body: &[u8],
        headers: &[u8],
        _grpc_status: i32,
    ) -> Status {
        self.state.borrow_mut().local_responses.push(LocalResponse {
            status_code,
            headers: MockState::decode(headers),
            body: body.to_vec(),
        });
        Status::Ok
    }

    fn clear_route_cache(&mut self) -> Status {
        Status::Ok
    }

    fn get_shared_data(&mut self, key: &[u8]) -> HostResult<(Option<Vec<u8>>, u32)> {
        match self.state.borrow().shared.get(key) {
            Some((value, cas)) => Ok((Some(value.clone()), *cas)),
            None => Err(Status::NotFound),
        }
    }

    fn set_shared_data(&mut self, key: &[u8], value: &[u8], cas: u32) -> Status {
        let mut state = self.state.borrow_mut();
        if let Some((_, current)) = state.shared.get(key) {
            if cas != 0 && cas != *current {
                return Status::CasMismatch;
            }
        }
        let next = state.next_cas;
        state.next_cas += 1;
        state.shared.insert(key.to_vec(), (value.to_vec(), next));
        Status::Ok
    }

    fn register_shared_queue(&mut self, name: &[u8]) -> HostResult<u32> {
        let mut state = self.state.borrow_mut();
        if let Some(id) = state.queue_names.get(name) {
            return Ok(*id);
        }
        let id = state.queue_names.len() as u32 + 1;
        state.queue_names.insert(name.to_vec(), id);
        state.queues.insert(id, VecDeque::new());
        Ok(id)
    }

    fn resolve_shared_queue(&mut self, _vm_id: &[u8], name: &[u8]) -> HostResult<u32> {
        self.state
            .borrow()
            .queue_names
            .get(name)
            .copied()
            .ok_or(Status::NotFound)
    }

    fn dequeue_shared_queue(&mut self, queue_id: u32) -> HostResult<Option<Vec<u8>>> {
        let mut state = self.state.borrow_mut();
        let queue = state.queues.get_mut(&queue_id).ok_or(Status::NotFound)?;
        match queue.pop_front() {
            Some(item) => Ok(Some(item)),
            None => Err(Status::Empty),
        }
    }

    fn enqueue_shared_queue(&mut self, queue_id: u32, value: &[u8]) -> Status {
        match self.state.borrow_mut().queues.get_mut(&queue_id) {
            Some(queue) => {
                queue.push_back(value.to_vec());
                Status::Ok
            }
            None => Status::NotFound,
        }
    }

    fn get_header_map_value(&mut self, map_type: u32, key: &[u8]) -> HostResult<Option<Vec<u8>>> {
        let key = text(key);
        let state = self.state.borrow();
        let pairs = state.maps.get(&map_type).ok_or(Status::NotFound)?;
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| Some(v.clone().into_bytes()))
            .ok_or(Status::NotFound)
    }

    fn add_header_map_value(&mut self, map_type: u32, key: &[u8], value: &[u8]) -> Status {
        self.state
            .borrow_mut()
            .maps
            .entry(map_type)
            .or_default()
            .push((text(key), text(value)));
        Status::Ok
    }

    fn replace_header_map_value(&mut self, map_type: u32, key: &[u8], value: &[u8]) -> Status {
        let (key, value) = (text(key), text(value));
        let mut state = self.state.borrow_mut();
        let pairs = state.maps.entry(map_type).or_default();
        pairs.retain(|(k, _)| *k != key);
        pairs.push((key, value));
        Status::Ok
    }

    fn remove_header_map_value(&mut self, map_type: u32, key: &[u8]) -> Status {
        let key = text(key);
        if let Some(pairs) = self.state.borrow_mut().maps.get_mut(&map_type) {
            pairs.retain(|(k, _)| *k != key);
        }
        Status::Ok
    }

    fn get_header_map_pairs(&mut self, map_type: u32) -> HostResult<Option<Vec<u8>>> {
        let state = self.state.borrow();
        if let Some(raw) = state.raw_maps.get(&map_type) {
            return Ok(Some(raw.clone()));
        }
        match state.maps.get(&map_type) {
            Some(pairs) => Ok(Some(map::encode(pairs).to_vec())),
            None => Ok(None),
        }
    }

    fn set_header_map_pairs(&mut self, map_type: u32, data: &[u8]) -> Status {
        let pairs = MockState::decode(data);
        self.state.borrow_mut().maps.insert(map_type, pairs);
        Status::Ok
    }

    fn get_buffer_bytes(
        &mut self,
        buffer_type: u32,
        start: usize,
        max_size: usize,
    ) -> HostResult<Option<Vec<u8>>> {
        match self.state.borrow().buffers.get(&buffer_type) {
            Some(Some(data)) => {
                let start = start.min(data.len());
                let end = start.saturating_add(max_size).min(data.len());
                Ok(Some(data[start..end].to_vec()))
            }
            Some(None) => Ok(None),
            None => Err(Status::NotFound),
        }
    }

    fn http_call(
        &mut self,
        upstream: &[u8],
        headers: &[u8],
        body: &[u8],
        trailers: &[u8],
        timeout_ms: u32,
    ) -> HostResult<u32> {
        let mut state = self.state.borrow_mut();
        state.callouts.push(Callout {
            upstream: text(upstream),
            headers: MockState::decode(headers),
            body: body.to_vec(),
            trailers: MockState::decode(trailers),
            timeout_ms,
        });
        let id = state.next_callout_id;
        state.next_callout_id += 1;
        Ok(id)
    }

    fn set_tick_period_milliseconds(&mut self, period: u32) -> Status {
        self.state.borrow_mut().tick_period_ms = Some(period);
        Status::Ok
    }

    fn get_current_time_nanoseconds(&mut self) -> HostResult<u64> {
        Ok(self.state.borrow().now_nanos)
    }

    fn set_effective_context(&mut self, context_id: u32) -> Status {
        self.state.borrow_mut().effective_contexts.push(context_id);
        Status::Ok
    }

    fn done(&mut self) -> Status {
        self.state.borrow_mut().done_calls += 1;
        Status::Ok
    }
}
