/// The window measurements point sizes depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    /// Height in logical pixels
    pub inner_height: f32,
    pub device_pixel_ratio: f32,
}

impl ViewportMetrics {
    pub fn new(inner_height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            inner_height,
            device_pixel_ratio,
        }
    }

    pub fn from_physical(height: u32, scale_factor: f64) -> Self {
        Self {
            inner_height: (height as f64 / scale_factor) as f32,
            device_pixel_ratio: scale_factor as f32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Called on every resize. Returning `false` unregisters the listener.
pub type ResizeListener = Box<dyn FnMut(&ViewportMetrics) -> bool>;

/// Current viewport metrics plus the listeners interested in them.
pub struct Viewport {
    metrics: ViewportMetrics,

    next_id: u64,
    listeners: Vec<(ListenerId, ResizeListener)>,
}

impl Viewport {
    pub fn new(metrics: ViewportMetrics) -> Self {
        Self {
            metrics,
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub fn metrics(&self) -> ViewportMetrics {
        self.metrics
    }

    pub fn add_resize_listener(&mut self, listener: ResizeListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_resize_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Stores the new metrics and notifies every listener, no coalescing.
    pub fn resize(&mut self, metrics: ViewportMetrics) {
        self.metrics = metrics;
        self.listeners.retain_mut(|(_, listener)| listener(&metrics));
    }
}
