//! In-memory desktop implementing every consumed surface, for tests
//!
//! Nodes double as accessibility elements and native windows: a node's id
//! is also its window handle. Hooks run when a node is invoked or clicked
//! and get the whole world to mutate, which is how tests script target
//! behavior (a save button opening a dialog, a confirm button writing a
//! file). Scheduled hooks fire after a number of dialog polls.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{
    Accessibility, ControlType, ElementInfo, ElementRef, ExpandState, UiError, UiResult, VirtualKey, WindowHandle,
    WindowMessaging,
};
use crate::process::{ProcessControl, ProcessError};

pub(crate) type Hook = Box<dyn FnMut(&mut World) + Send>;

struct Node {
    parent: Option<u64>,
    children: Vec<u64>,
    info: ElementInfo,
    value: String,
    read_only: bool,
    ignore_writes: bool,
    selected: Vec<u64>,
    expand: ExpandState,
}

pub(crate) struct World {
    next_id: u64,
    nodes: HashMap<u64, Node>,
    modals: HashMap<u64, Vec<u64>>,
    hooks: HashMap<u64, Hook>,
    scheduled: Vec<(usize, Hook)>,
    calls: Vec<String>,
    launches: HashMap<PathBuf, (u32, String)>,
    products: HashMap<u32, String>,
    exited: HashSet<u32>,
    polls: usize,
}

fn handle(id: u64) -> WindowHandle {
    WindowHandle(id as isize)
}

impl World {
    fn new() -> Self {
        World {
            next_id: 100,
            nodes: HashMap::new(),
            modals: HashMap::new(),
            hooks: HashMap::new(),
            scheduled: Vec::new(),
            calls: Vec::new(),
            launches: HashMap::new(),
            products: HashMap::new(),
            exited: HashSet::new(),
            polls: 0,
        }
    }

    pub fn add_node(
        &mut self,
        parent: Option<u64>,
        control_type: ControlType,
        automation_id: &str,
        name: &str,
        class_name: &str,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let node = Node {
            parent,
            children: Vec::new(),
            info: ElementInfo {
                control_type,
                automation_id: automation_id.to_string(),
                name: name.to_string(),
                class_name: class_name.to_string(),
                is_enabled: true,
                native_window: Some(handle(id)),
            },
            value: String::new(),
            read_only: false,
            ignore_writes: false,
            selected: Vec::new(),
            expand: ExpandState::Collapsed,
        };
        self.nodes.insert(id, node);
        if let Some(parent) = parent
            && let Some(p) = self.nodes.get_mut(&parent)
        {
            p.children.push(id);
        }
        id
    }

    pub fn child(&mut self, parent: u64, control_type: ControlType, automation_id: &str, name: &str) -> u64 {
        let class = match control_type {
            ControlType::Edit => "Edit",
            ControlType::Button => "Button",
            ControlType::ProgressBar => "msctls_progress32",
            ControlType::ComboBox => "ComboBox",
            ControlType::CheckBox => "Button",
            _ => "Static",
        };
        self.add_node(Some(parent), control_type, automation_id, name, class)
    }

    /// Open a modal dialog owned by `owner`; returns the dialog node
    pub fn open_modal(&mut self, owner: u64, title: &str) -> u64 {
        let id = self.add_node(None, ControlType::Window, "", title, "#32770");
        self.modals.entry(owner).or_default().push(id);
        id
    }

    pub fn remove(&mut self, id: u64) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        for child in node.children {
            self.remove(child);
        }
        if let Some(parent) = node.parent
            && let Some(p) = self.nodes.get_mut(&parent)
        {
            p.children.retain(|&c| c != id);
        }
        for dialogs in self.modals.values_mut() {
            dialogs.retain(|&d| d != id);
        }
        self.hooks.remove(&id);
    }

    pub fn exists(&self, id: u64) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn set_enabled(&mut self, id: u64, enabled: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.info.is_enabled = enabled;
        }
    }

    pub fn set_read_only(&mut self, id: u64, read_only: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.read_only = read_only;
        }
    }

    pub fn value(&self, id: u64) -> String {
        self.nodes.get(&id).map(|n| n.value.clone()).unwrap_or_default()
    }

    pub fn set_value(&mut self, id: u64, value: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.value = value.to_string();
        }
    }

    /// Find the first descendant of `root` with the given automation id
    pub fn find(&self, root: u64, automation_id: &str) -> Option<u64> {
        let node = self.nodes.get(&root)?;
        for &child in &node.children {
            if self.nodes.get(&child).is_some_and(|c| c.info.automation_id == automation_id) {
                return Some(child);
            }
            if let Some(found) = self.find(child, automation_id) {
                return Some(found);
            }
        }
        None
    }

    pub fn on_invoke(&mut self, id: u64, hook: impl FnMut(&mut World) + Send + 'static) {
        self.hooks.insert(id, Box::new(hook));
    }

    /// Run `hook` after `polls` more dialog scans
    pub fn schedule(&mut self, polls: usize, hook: impl FnMut(&mut World) + Send + 'static) {
        self.scheduled.push((polls, Box::new(hook)));
    }

    pub fn record(&mut self, call: String) {
        self.calls.push(call);
    }

    fn label(&self, id: u64) -> String {
        match self.nodes.get(&id) {
            Some(node) if !node.info.automation_id.is_empty() => node.info.automation_id.clone(),
            Some(node) => node.info.name.clone(),
            None => format!("#{}", id),
        }
    }

    fn top(&self, mut id: u64) -> u64 {
        while let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) {
            id = parent;
        }
        id
    }

    fn element(&self, id: u64) -> ElementRef {
        ElementRef::new(handle(self.top(id)), id)
    }

    fn node(&self, id: u64) -> UiResult<&Node> {
        self.nodes.get(&id).ok_or(UiError::NotAvailable)
    }

    fn fire(&mut self, id: u64) {
        if let Some(mut hook) = self.hooks.remove(&id) {
            hook(self);
            if self.exists(id) {
                self.hooks.entry(id).or_insert(hook);
            }
        }
    }

    fn tick(&mut self) {
        self.polls += 1;
        let mut due = Vec::new();
        let mut pending = Vec::new();
        for (remaining, hook) in self.scheduled.drain(..) {
            if remaining <= 1 {
                due.push(hook);
            } else {
                pending.push((remaining - 1, hook));
            }
        }
        self.scheduled = pending;
        for mut hook in due {
            hook(self);
        }
    }

    fn descendants(&self, id: u64, out: &mut Vec<u64>) {
        if let Some(node) = self.nodes.get(&id) {
            for &child in &node.children {
                out.push(child);
                self.descendants(child, out);
            }
        }
    }
}

/// Shared fake desktop
pub(crate) struct FakeDesktop {
    world: Mutex<World>,
}

impl FakeDesktop {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeDesktop {
            world: Mutex::new(World::new()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_world<T>(&self, f: impl FnOnce(&mut World) -> T) -> T {
        f(&mut self.lock())
    }

    pub fn add_window(&self, title: &str, class_name: &str) -> WindowHandle {
        handle(self.lock().add_node(None, ControlType::Window, "", title, class_name))
    }

    pub fn add_child(
        &self,
        parent: WindowHandle,
        control_type: ControlType,
        automation_id: &str,
        name: &str,
        class_name: &str,
    ) -> WindowHandle {
        handle(
            self.lock()
                .add_node(Some(parent.0 as u64), control_type, automation_id, name, class_name),
        )
    }

    pub fn on_invoke(&self, node: WindowHandle, hook: impl FnMut(&mut World) + Send + 'static) {
        self.lock().on_invoke(node.0 as u64, hook);
    }

    pub fn remove(&self, node: WindowHandle) {
        self.lock().remove(node.0 as u64);
    }

    pub fn set_enabled(&self, node: WindowHandle, enabled: bool) {
        self.lock().set_enabled(node.0 as u64, enabled);
    }

    pub fn set_read_only(&self, node: WindowHandle, read_only: bool) {
        self.lock().set_read_only(node.0 as u64, read_only);
    }

    pub fn ignore_writes(&self, node: WindowHandle, ignore: bool) {
        if let Some(n) = self.lock().nodes.get_mut(&(node.0 as u64)) {
            n.ignore_writes = ignore;
        }
    }

    pub fn value(&self, node: WindowHandle) -> String {
        self.lock().value(node.0 as u64)
    }

    pub fn set_value(&self, node: WindowHandle, value: &str) {
        self.lock().set_value(node.0 as u64, value);
    }

    pub fn select(&self, list: WindowHandle, item: WindowHandle) {
        if let Some(n) = self.lock().nodes.get_mut(&(list.0 as u64)) {
            n.selected = vec![item.0 as u64];
        }
    }

    pub fn open_modal(&self, owner: WindowHandle, title: &str) -> WindowHandle {
        handle(self.lock().open_modal(owner.0 as u64, title))
    }

    /// Every recorded surface call, in order
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Recorded calls starting with `prefix`
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls().into_iter().filter(|c| c.starts_with(prefix)).collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Register an executable that launches as `pid` reporting `product`
    pub fn register_launch(&self, path: &Path, pid: u32, product: &str) {
        self.lock()
            .launches
            .insert(path.to_path_buf(), (pid, product.to_string()));
    }

    pub fn set_product(&self, pid: u32, product: &str) {
        self.lock().products.insert(pid, product.to_string());
    }
}

impl Accessibility for FakeDesktop {
    fn element_from_window(&self, window: WindowHandle) -> UiResult<ElementRef> {
        let world = self.lock();
        let id = window.0 as u64;
        let node = world.node(id)?;
        if node.parent.is_some() {
            return Err(UiError::Platform("not a top-level window".to_string()));
        }
        Ok(world.element(id))
    }

    fn children(&self, element: &ElementRef) -> UiResult<Vec<ElementRef>> {
        let world = self.lock();
        let node = world.node(element.runtime_id())?;
        Ok(node.children.iter().map(|&c| world.element(c)).collect())
    }

    fn info(&self, element: &ElementRef) -> UiResult<ElementInfo> {
        Ok(self.lock().node(element.runtime_id())?.info.clone())
    }

    fn value(&self, element: &ElementRef) -> UiResult<String> {
        Ok(self.lock().node(element.runtime_id())?.value.clone())
    }

    fn set_value(&self, element: &ElementRef, value: &str) -> UiResult<()> {
        let mut world = self.lock();
        let id = element.runtime_id();
        let label = world.label(id);
        world.record(format!("set_value:{}", label));
        let node = world.nodes.get_mut(&id).ok_or(UiError::NotAvailable)?;
        if node.read_only {
            return Err(UiError::ReadOnly);
        }
        if !node.ignore_writes {
            node.value = value.to_string();
        }
        Ok(())
    }

    fn is_read_only(&self, element: &ElementRef) -> UiResult<bool> {
        Ok(self.lock().node(element.runtime_id())?.read_only)
    }

    fn invoke(&self, element: &ElementRef) -> UiResult<()> {
        let mut world = self.lock();
        let id = element.runtime_id();
        let label = world.label(id);
        world.record(format!("invoke:{}", label));
        if !world.node(id)?.info.is_enabled {
            return Err(UiError::Platform("element not enabled".to_string()));
        }
        world.fire(id);
        Ok(())
    }

    fn expand_state(&self, element: &ElementRef) -> UiResult<ExpandState> {
        Ok(self.lock().node(element.runtime_id())?.expand)
    }

    fn expand(&self, element: &ElementRef) -> UiResult<()> {
        let mut world = self.lock();
        let node = world.nodes.get_mut(&element.runtime_id()).ok_or(UiError::NotAvailable)?;
        node.expand = ExpandState::Expanded;
        Ok(())
    }

    fn collapse(&self, element: &ElementRef) -> UiResult<()> {
        let mut world = self.lock();
        let node = world.nodes.get_mut(&element.runtime_id()).ok_or(UiError::NotAvailable)?;
        node.expand = ExpandState::Collapsed;
        Ok(())
    }

    fn selection(&self, element: &ElementRef) -> UiResult<Vec<ElementRef>> {
        let world = self.lock();
        let node = world.node(element.runtime_id())?;
        Ok(node.selected.iter().map(|&s| world.element(s)).collect())
    }

    fn modal_windows(&self, owner: WindowHandle) -> UiResult<Vec<ElementRef>> {
        let mut world = self.lock();
        world.tick();
        let owner = owner.0 as u64;
        world.node(owner)?;
        let dialogs = world.modals.get(&owner).cloned().unwrap_or_default();
        Ok(dialogs.into_iter().map(|d| world.element(d)).collect())
    }
}

impl WindowMessaging for FakeDesktop {
    fn descendants(&self, window: WindowHandle) -> UiResult<Vec<WindowHandle>> {
        let world = self.lock();
        let id = window.0 as u64;
        world.node(id)?;
        let mut out = Vec::new();
        world.descendants(id, &mut out);
        Ok(out.into_iter().map(handle).collect())
    }

    fn class_name(&self, window: WindowHandle) -> UiResult<String> {
        Ok(self.lock().node(window.0 as u64)?.info.class_name.clone())
    }

    fn control_id(&self, window: WindowHandle) -> UiResult<i32> {
        let world = self.lock();
        let node = world.node(window.0 as u64)?;
        node.info
            .automation_id
            .parse()
            .map_err(|_| UiError::Platform("no control id".to_string()))
    }

    fn text(&self, window: WindowHandle, _timeout: Duration) -> UiResult<String> {
        let world = self.lock();
        let node = world.node(window.0 as u64)?;
        Ok(match node.info.control_type {
            ControlType::Edit | ControlType::ComboBox => node.value.clone(),
            _ => node.info.name.clone(),
        })
    }

    fn set_text(&self, window: WindowHandle, text: &str, _timeout: Duration) -> UiResult<()> {
        let mut world = self.lock();
        let id = window.0 as u64;
        let label = world.label(id);
        world.record(format!("set_text:{}", label));
        let node = world.nodes.get_mut(&id).ok_or(UiError::NotAvailable)?;
        match node.info.control_type {
            ControlType::Edit | ControlType::ComboBox => node.value = text.to_string(),
            _ => node.info.name = text.to_string(),
        }
        Ok(())
    }

    fn is_enabled(&self, window: WindowHandle) -> UiResult<bool> {
        Ok(self.lock().node(window.0 as u64)?.info.is_enabled)
    }

    fn is_window(&self, window: WindowHandle) -> bool {
        self.lock().exists(window.0 as u64)
    }

    fn post_click(&self, button: WindowHandle) -> UiResult<()> {
        let mut world = self.lock();
        let id = button.0 as u64;
        let label = world.label(id);
        world.record(format!("click:{}", label));
        if world.node(id)?.info.is_enabled {
            world.fire(id);
        }
        Ok(())
    }

    fn post_key_down(&self, window: WindowHandle, key: VirtualKey) -> UiResult<()> {
        let mut world = self.lock();
        let id = window.0 as u64;
        world.node(id)?;
        let label = world.label(id);
        world.record(format!("key:{}:{:?}", label, key));
        Ok(())
    }

    fn post_key_up(&self, window: WindowHandle, _key: VirtualKey) -> UiResult<()> {
        self.lock().node(window.0 as u64).map(|_| ())
    }

    fn owned_windows(&self, owner: WindowHandle) -> UiResult<Vec<WindowHandle>> {
        let mut world = self.lock();
        world.tick();
        let owner = owner.0 as u64;
        world.node(owner)?;
        Ok(world
            .modals
            .get(&owner)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(handle)
            .collect())
    }

    fn activate(&self, window: WindowHandle) -> UiResult<()> {
        let mut world = self.lock();
        let id = window.0 as u64;
        world.node(id)?;
        let label = world.label(id);
        world.record(format!("activate:{}", label));
        Ok(())
    }
}

impl ProcessControl for FakeDesktop {
    fn spawn(&self, path: &Path) -> Result<u32, ProcessError> {
        let mut world = self.lock();
        world.record(format!("spawn:{}", path.display()));
        let (pid, product) = world.launches.get(path).cloned().ok_or_else(|| ProcessError::Launch {
            path: path.to_path_buf(),
            reason: "not found".to_string(),
        })?;
        world.products.insert(pid, product);
        world.exited.remove(&pid);
        Ok(pid)
    }

    fn wait_for_input_idle(&self, _pid: u32, _timeout: Duration) -> bool {
        true
    }

    fn product_name(&self, pid: u32) -> Option<String> {
        self.lock().products.get(&pid).cloned()
    }

    fn close_main_window(&self, pid: u32) -> bool {
        let mut world = self.lock();
        world.record(format!("close:{}", pid));
        world.exited.insert(pid);
        true
    }

    fn kill(&self, pid: u32) -> bool {
        let mut world = self.lock();
        world.record(format!("kill:{}", pid));
        world.exited.insert(pid);
        true
    }

    fn has_exited(&self, pid: u32) -> bool {
        self.lock().exited.contains(&pid)
    }
}
