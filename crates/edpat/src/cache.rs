// Per-consumer compiled pattern cache
//
// EQS, GET and REPLACE each keep the DFA of the last pattern they used.
// A new parameter is always re-parsed, but converted only when its
// canonical definition differs from the cached one.

use crate::cancel::CancelToken;
use crate::convert::convert;
use crate::dfa::Dfa;
use crate::error::PatternResult;
use crate::parser::{CompileContext, compile};
use crate::source::Parameter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumer {
    Eqs,
    Get,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Same definition as before; the cached DFA was kept.
    Reused,
    /// A new DFA replaced the cached one.
    Rebuilt,
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub definition: Vec<u8>,
    pub dfa: Dfa,
}

#[derive(Debug, Default)]
pub struct PatternSlot {
    current: Option<CompiledPattern>,
}

impl PatternSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make this slot hold the DFA for `param`.
    ///
    /// On any error the previously cached pattern stays in place.
    pub fn prepare(
        &mut self,
        param: &Parameter,
        ctx: &CompileContext,
        cancel: &CancelToken,
    ) -> PatternResult<CacheOutcome> {
        let compiled = compile(param, ctx)?;
        if let Some(current) = &self.current
            && current.definition == compiled.definition
        {
            log::debug!(
                "reusing cached DFA for {:?}",
                String::from_utf8_lossy(&current.definition)
            );
            return Ok(CacheOutcome::Reused);
        }
        let dfa = convert(&compiled, ctx.options, cancel)?;
        self.current = Some(CompiledPattern {
            definition: compiled.definition,
            dfa,
        });
        Ok(CacheOutcome::Rebuilt)
    }

    pub fn pattern(&self) -> Option<&CompiledPattern> {
        self.current.as_ref()
    }

    pub fn dfa(&self) -> Option<&Dfa> {
        self.current.as_ref().map(|p| &p.dfa)
    }

    pub fn definition(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|p| p.definition.as_slice())
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// One slot per consumer.
#[derive(Debug, Default)]
pub struct PatternCache {
    pub eqs: PatternSlot,
    pub get: PatternSlot,
    pub replace: PatternSlot,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, consumer: Consumer) -> &PatternSlot {
        match consumer {
            Consumer::Eqs => &self.eqs,
            Consumer::Get => &self.get,
            Consumer::Replace => &self.replace,
        }
    }

    pub fn slot_mut(&mut self, consumer: Consumer) -> &mut PatternSlot {
        match consumer {
            Consumer::Eqs => &mut self.eqs,
            Consumer::Get => &mut self.get,
            Consumer::Replace => &mut self.replace,
        }
    }

    pub fn prepare(
        &mut self,
        consumer: Consumer,
        param: &Parameter,
        ctx: &CompileContext,
        cancel: &CancelToken,
    ) -> PatternResult<CacheOutcome> {
        self.slot_mut(consumer).prepare(param, ctx, cancel)
    }
}
