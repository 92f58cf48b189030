//! One-shot core initialization

pub trait SystemInit: Send + Sync {
    /// Run the system clock at its maximum frequency
    fn clock_max(&self);

    /// Apply the default cache configuration
    fn cache_config_default(&self);

    fn cache_enable(&self);

    fn fpu_enable(&self);

    /// Let the FPU context be stacked lazily on exception entry
    fn fpu_lazy_stacking(&self);
}
