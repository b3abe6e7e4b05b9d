use std::collections::HashMap;

use crate::context::ContextId;
use crate::device::RawProgram;

/// Supplies linked programs for (vertex, fragment) source pairs.
///
/// The renderer never compiles shaders itself. Programs are requested again
/// after every context restoration.
pub trait ProgramProvider {
    fn compile(&mut self, context: ContextId, vertex: &str, fragment: &str) -> Option<RawProgram>;

    /// Called when the renderer drops a program it obtained from `compile`.
    fn release(&mut self, _program: RawProgram) {}
}

/// A program usable in one context generation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Shader {
    program: RawProgram,
    context: ContextId,
}

impl Shader {
    #[inline]
    pub fn program(&self) -> RawProgram {
        self.program
    }

    #[inline]
    pub fn context(&self) -> ContextId {
        self.context
    }
}

/// Program cache for the current context generation.
#[derive(Debug)]
pub struct ShaderManager {
    context: ContextId,
    programs: HashMap<(String, String), RawProgram>,
}

impl ShaderManager {
    pub fn new(context: ContextId) -> Self {
        Self {
            context,
            programs: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Cached program for the pair, compiling it on first use.
    pub fn get_or_compile(
        &mut self,
        provider: &mut dyn ProgramProvider,
        vertex: &str,
        fragment: &str,
    ) -> Option<Shader> {
        let key = (vertex.to_owned(), fragment.to_owned());
        let program = match self.programs.get(&key) {
            Some(&program) => program,
            None => {
                let program = provider.compile(self.context, vertex, fragment)?;
                log::debug!("compiled {program:?} for {:?}", self.context);
                self.programs.insert(key, program);
                program
            }
        };
        Some(Shader {
            program,
            context: self.context,
        })
    }

    /// Drops every cached program without notifying the provider.
    pub fn forget_all(&mut self) {
        self.programs.clear();
    }

    pub fn destroy_all(&mut self, provider: &mut dyn ProgramProvider) {
        for (_, program) in self.programs.drain() {
            provider.release(program);
        }
    }
}
