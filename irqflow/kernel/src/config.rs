//! Kernel configuration.

use irqflow_core::Ticks;

/// Bytes of heap a task control block costs on top of its stack
pub const TASK_CONTROL_BLOCK_BYTES: usize = 96;

/// Bytes of heap a queue control block costs on top of its slots
pub const QUEUE_CONTROL_BLOCK_BYTES: usize = 80;

/// Bytes per stack word
pub const STACK_WORD_BYTES: usize = 4;

/// Configuration for the kernel.
///
/// `heap_bytes` bounds everything created at bootstrap (task stacks and
/// control blocks, queue storage); exceeding it diverts to the
/// allocation-failure hook.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub name: &'static str,
    pub heap_bytes: usize,
    pub tick_hz: u32,
    /// Shorter expected idle periods skip the sleep/wake hooks
    pub expected_idle_before_sleep: Ticks,
    pub build_info: Option<&'static str>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: "irqflow",
            heap_bytes: 16 * 1024,
            tick_hz: 1000,
            expected_idle_before_sleep: Ticks(2),
            build_info: None,
        }
    }
}

impl KernelConfig {
    /// Creates a new kernel configuration builder.
    pub fn builder() -> KernelConfigBuilder {
        KernelConfigBuilder::default()
    }
}

/// Builder for ergonomic kernel configuration construction.
#[derive(Debug, Clone, Default)]
pub struct KernelConfigBuilder {
    config: KernelConfig,
}

impl KernelConfigBuilder {
    /// Sets the kernel name.
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    /// Sets the heap available to task and queue creation.
    pub fn heap_bytes(mut self, bytes: usize) -> Self {
        self.config.heap_bytes = bytes;
        self
    }

    /// Sets the scheduler tick rate.
    pub fn tick_hz(mut self, hz: u32) -> Self {
        self.config.tick_hz = hz;
        self
    }

    /// Sets the shortest expected idle period that enters the sleep hook.
    pub fn expected_idle_before_sleep(mut self, ticks: Ticks) -> Self {
        self.config.expected_idle_before_sleep = ticks;
        self
    }

    /// Sets build information string.
    pub fn build_info(mut self, info: &'static str) -> Self {
        self.config.build_info = Some(info);
        self
    }

    /// Builds the kernel configuration.
    pub fn build(self) -> KernelConfig {
        self.config
    }
}
