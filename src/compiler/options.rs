/// Switches for one compilation run.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Name of the produced LLVM module
    pub module_name: String,
    /// Whether every finished function is run through the LLVM verifier
    pub verify_functions: bool,
    /// Whether the module gets the host triple and data layout
    pub native_target: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            module_name: String::from("chovl"),
            verify_functions: true,
            native_target: false,
        }
    }
}

impl CompilerOptions {
    pub fn with_module_name(mut self, module_name: &str) -> Self {
        self.module_name = module_name.to_string();
        self
    }
}
