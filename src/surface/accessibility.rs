use super::{UiError, UiResult, WindowHandle};

/// Element roles the drivers care about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ControlType {
    Window,
    Pane,
    Edit,
    Button,
    Text,
    List,
    ListItem,
    ComboBox,
    CheckBox,
    RadioButton,
    ProgressBar,
    TabItem,
    #[default]
    Custom,
}

/// Expand/collapse pattern state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandState {
    Collapsed,
    Expanded,
    PartiallyExpanded,
    LeafNode,
}

/// Back-reference to an element of some window's accessibility tree
///
/// Never owns anything in the target process. It goes stale when the
/// element disappears; surface calls then fail with [`UiError::NotAvailable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    window: WindowHandle,
    runtime_id: u64,
}

impl ElementRef {
    pub fn new(window: WindowHandle, runtime_id: u64) -> Self {
        ElementRef { window, runtime_id }
    }

    /// Top-level window this element was found under
    pub fn window(&self) -> WindowHandle {
        self.window
    }

    pub fn runtime_id(&self) -> u64 {
        self.runtime_id
    }
}

/// Snapshot of an element's identifying properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementInfo {
    pub control_type: ControlType,
    pub automation_id: String,
    pub name: String,
    pub class_name: String,
    pub is_enabled: bool,
    /// Native handle, for elements backed by a real window
    pub native_window: Option<WindowHandle>,
}

/// Element predicate by identifier, role, name and class
///
/// Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Condition {
    pub automation_id: Option<String>,
    pub control_type: Option<ControlType>,
    pub name: Option<String>,
    pub class_name: Option<String>,
}

impl Condition {
    pub fn new() -> Self {
        Condition::default()
    }

    pub fn automation_id(mut self, id: impl Into<String>) -> Self {
        self.automation_id = Some(id.into());
        self
    }

    pub fn control_type(mut self, control_type: ControlType) -> Self {
        self.control_type = Some(control_type);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn matches(&self, info: &ElementInfo) -> bool {
        self.automation_id
            .as_ref()
            .is_none_or(|id| *id == info.automation_id)
            && self.control_type.is_none_or(|t| t == info.control_type)
            && self.name.as_ref().is_none_or(|n| *n == info.name)
            && self
                .class_name
                .as_ref()
                .is_none_or(|c| *c == info.class_name)
    }
}

/// The OS accessibility tree, as seen by the drivers
///
/// Implementations must be safe for concurrent read-only queries from
/// several drivers. `find_first` and `find_all` default to a depth-first
/// walk over `children`; native backends may override them.
pub trait Accessibility: Send + Sync {
    /// Root element of a top-level window
    fn element_from_window(&self, window: WindowHandle) -> UiResult<ElementRef>;

    /// Direct children of an element
    fn children(&self, element: &ElementRef) -> UiResult<Vec<ElementRef>>;

    /// Identifying properties of an element
    fn info(&self, element: &ElementRef) -> UiResult<ElementInfo>;

    /// Value pattern: current text
    fn value(&self, element: &ElementRef) -> UiResult<String>;

    /// Value pattern: assign text
    fn set_value(&self, element: &ElementRef, value: &str) -> UiResult<()>;

    /// Value pattern: read-only flag
    fn is_read_only(&self, element: &ElementRef) -> UiResult<bool>;

    /// Invoke pattern
    fn invoke(&self, element: &ElementRef) -> UiResult<()>;

    /// Expand/collapse pattern: current state
    fn expand_state(&self, element: &ElementRef) -> UiResult<ExpandState>;

    /// Expand/collapse pattern: expand
    fn expand(&self, element: &ElementRef) -> UiResult<()>;

    /// Expand/collapse pattern: collapse
    fn collapse(&self, element: &ElementRef) -> UiResult<()>;

    /// Selection pattern: selected items of a list-like container
    fn selection(&self, element: &ElementRef) -> UiResult<Vec<ElementRef>>;

    /// Modal windows currently owned by a top-level window
    fn modal_windows(&self, owner: WindowHandle) -> UiResult<Vec<ElementRef>>;

    /// First descendant matching `condition`
    fn find_first(&self, root: &ElementRef, condition: &Condition) -> UiResult<Option<ElementRef>> {
        let mut stack = self.children(root)?;
        stack.reverse();
        while let Some(element) = stack.pop() {
            // Elements can vanish mid-walk; skip them rather than failing the search
            match self.info(&element) {
                Ok(info) if condition.matches(&info) => return Ok(Some(element)),
                Ok(_) => {}
                Err(UiError::NotAvailable) => continue,
                Err(e) => return Err(e),
            }
            if let Ok(mut children) = self.children(&element) {
                children.reverse();
                stack.extend(children);
            }
        }
        Ok(None)
    }

    /// Every descendant matching `condition`, in document order
    fn find_all(&self, root: &ElementRef, condition: &Condition) -> UiResult<Vec<ElementRef>> {
        let mut found = Vec::new();
        let mut stack = self.children(root)?;
        stack.reverse();
        while let Some(element) = stack.pop() {
            match self.info(&element) {
                Ok(info) if condition.matches(&info) => found.push(element.clone()),
                Ok(_) => {}
                Err(UiError::NotAvailable) => continue,
                Err(e) => return Err(e),
            }
            if let Ok(mut children) = self.children(&element) {
                children.reverse();
                stack.extend(children);
            }
        }
        Ok(found)
    }
}
