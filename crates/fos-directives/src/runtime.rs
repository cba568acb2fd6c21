//! Dispatch runtime
//!
//! Owns the bindings of one document: registers native listeners (or
//! outside-click entries), runs each binding's guard pipeline when its event
//! fires, evaluates the expression, and tears bindings down when their
//! element leaves the document.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;

use fos_dom::{Dom, Event, ListenerId, NodeId, ObserverId};
use fos_js::{JsValue, Scope, TimerManager};

use crate::attribute::is_directive_attribute;
use crate::builder::{Guard, ListenerPlan};
use crate::debounce::Debouncer;
use crate::effect::{EffectFailure, ExpressionEvaluator, ScriptEvaluator};
use crate::outside::OutsideClickTracker;
use crate::{BindingId, Directive, DirectiveConfig, DirectiveError};

/// Callback receiving expression failures
pub type ErrorHook = Rc<dyn Fn(&EffectFailure)>;

/// Fire-time state of one binding
struct Pipeline {
    binding: BindingId,
    element: NodeId,
    event_name: String,
    expression: String,
    scope: Scope,
    guards: Vec<Guard>,
    once: bool,
    fired: Cell<bool>,
    debouncer: Option<Rc<Debouncer>>,
}

struct Binding {
    element: NodeId,
    directive: Directive,
    plan: ListenerPlan,
    pipeline: Rc<Pipeline>,
    /// `None` for outside bindings, which the tracker dispatches
    listener: Option<ListenerId>,
}

struct RuntimeInner {
    dom: Dom,
    timers: TimerManager,
    config: DirectiveConfig,
    evaluator: Rc<dyn ExpressionEvaluator>,
    tracker: Rc<OutsideClickTracker>,
    bindings: RefCell<BTreeMap<BindingId, Binding>>,
    next_id: Cell<u64>,
    error_hooks: RefCell<Vec<ErrorHook>>,
    observer: Cell<Option<ObserverId>>,
}

/// Event directive runtime for one document
///
/// Cloning shares the same runtime. Dropping the last handle removes every
/// listener it registered.
#[derive(Clone)]
pub struct DirectiveRuntime {
    inner: Rc<RuntimeInner>,
}

impl fmt::Debug for DirectiveRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveRuntime")
            .field("bindings", &self.inner.bindings.borrow().len())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Builder for `DirectiveRuntime`
pub struct DirectiveRuntimeBuilder {
    dom: Dom,
    timers: Option<TimerManager>,
    config: DirectiveConfig,
    evaluator: Option<Rc<dyn ExpressionEvaluator>>,
    tracker: Option<Rc<OutsideClickTracker>>,
}

impl DirectiveRuntimeBuilder {
    /// Timer queue debounced bindings arm timers on
    pub fn timers(mut self, timers: TimerManager) -> Self {
        self.timers = Some(timers);
        self
    }

    pub fn config(mut self, config: DirectiveConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the built-in `ScriptEvaluator`
    pub fn evaluator(mut self, evaluator: impl ExpressionEvaluator + 'static) -> Self {
        self.evaluator = Some(Rc::new(evaluator));
        self
    }

    /// Share an outside-click tracker instead of creating one
    pub fn tracker(mut self, tracker: Rc<OutsideClickTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn build(self) -> DirectiveRuntime {
        let inner = Rc::new(RuntimeInner {
            dom: self.dom,
            timers: self.timers.unwrap_or_default(),
            config: self.config,
            evaluator: self.evaluator.unwrap_or_else(|| Rc::new(ScriptEvaluator::new())),
            tracker: self.tracker.unwrap_or_else(OutsideClickTracker::new),
            bindings: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(0),
            error_hooks: RefCell::new(Vec::new()),
            observer: Cell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let observer = inner.dom.observe_removals(Rc::new(move |removed: &[NodeId]| {
            if let Some(inner) = weak.upgrade() {
                inner.unbind_removed(removed);
            }
        }));
        inner.observer.set(Some(observer));

        DirectiveRuntime { inner }
    }
}

impl DirectiveRuntime {
    pub fn builder(dom: Dom) -> DirectiveRuntimeBuilder {
        DirectiveRuntimeBuilder {
            dom,
            timers: None,
            config: DirectiveConfig::default(),
            evaluator: None,
            tracker: None,
        }
    }

    /// Runtime with default configuration and the built-in evaluator
    pub fn new(dom: Dom, timers: TimerManager) -> Self {
        Self::builder(dom).timers(timers).build()
    }

    pub fn dom(&self) -> &Dom {
        &self.inner.dom
    }

    pub fn timers(&self) -> &TimerManager {
        &self.inner.timers
    }

    pub fn config(&self) -> &DirectiveConfig {
        &self.inner.config
    }

    pub fn tracker(&self) -> &Rc<OutsideClickTracker> {
        &self.inner.tracker
    }

    /// Bind one directive attribute on `element`
    pub fn bind(
        &self,
        element: NodeId,
        attribute: &str,
        expression: &str,
        scope: &Scope,
    ) -> Result<BindingId, DirectiveError> {
        let directive = Directive::parse(attribute, expression, &self.inner.config)?;
        self.bind_directive(element, directive, scope)
    }

    /// Bind an already parsed directive
    pub fn bind_directive(
        &self,
        element: NodeId,
        directive: Directive,
        scope: &Scope,
    ) -> Result<BindingId, DirectiveError> {
        self.inner.bind(element, directive, scope)
    }

    /// Bind every event directive attribute present on `element`
    ///
    /// Either all of them bind or none do.
    pub fn bind_attributes(&self, element: NodeId, scope: &Scope) -> Result<Vec<BindingId>, DirectiveError> {
        let attributes: Vec<(String, String)> = {
            let document = self.inner.dom.document();
            let el = document
                .tree()
                .element(element)
                .ok_or(DirectiveError::UnknownElement(element))?;
            el.attrs
                .iter()
                .filter(|attr| is_directive_attribute(&attr.name, &self.inner.config))
                .map(|attr| (attr.name.clone(), attr.value.clone()))
                .collect()
        };

        let mut bound = Vec::with_capacity(attributes.len());
        for (name, value) in attributes {
            match self.bind(element, &name, &value, scope) {
                Ok(id) => bound.push(id),
                Err(err) => {
                    for id in bound {
                        self.unbind(id);
                    }
                    return Err(err);
                }
            }
        }
        Ok(bound)
    }

    /// Remove a binding: its listener, outside entry and pending debounce
    pub fn unbind(&self, id: BindingId) -> bool {
        self.inner.unbind(id)
    }

    /// Remove every binding owned by `element`
    pub fn unbind_element(&self, element: NodeId) -> usize {
        self.inner.unbind_removed(&[element])
    }

    pub fn is_bound(&self, id: BindingId) -> bool {
        self.inner.bindings.borrow().contains_key(&id)
    }

    pub fn binding_count(&self) -> usize {
        self.inner.bindings.borrow().len()
    }

    /// Bindings owned by `element`, oldest first
    pub fn bindings_for(&self, element: NodeId) -> Vec<BindingId> {
        self.inner
            .bindings
            .borrow()
            .iter()
            .filter(|(_, binding)| binding.element == element)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Listener plan of a binding
    pub fn plan(&self, id: BindingId) -> Option<ListenerPlan> {
        self.inner.bindings.borrow().get(&id).map(|b| b.plan.clone())
    }

    pub fn directive(&self, id: BindingId) -> Option<Directive> {
        self.inner.bindings.borrow().get(&id).map(|b| b.directive.clone())
    }

    /// Whether a debounced invocation is waiting
    pub fn is_pending(&self, id: BindingId) -> bool {
        self.inner
            .bindings
            .borrow()
            .get(&id)
            .and_then(|b| b.pipeline.debouncer.as_ref().map(|d| d.is_pending()))
            .unwrap_or(false)
    }

    /// Receive expression failures
    pub fn on_error(&self, hook: impl Fn(&EffectFailure) + 'static) {
        self.inner.error_hooks.borrow_mut().push(Rc::new(hook));
    }

    /// Unbind every outside binding and reset the tracker
    pub fn reset_outside_tracker(&self) {
        let outside: Vec<BindingId> = self
            .inner
            .bindings
            .borrow()
            .iter()
            .filter(|(_, binding)| binding.plan.is_outside())
            .map(|(id, _)| *id)
            .collect();
        for id in outside {
            self.inner.unbind(id);
        }
        self.inner.tracker.reset(&self.inner.dom);
    }
}

impl RuntimeInner {
    fn bind(self: &Rc<Self>, element: NodeId, directive: Directive, scope: &Scope) -> Result<BindingId, DirectiveError> {
        if self.dom.document().tree().element(element).is_none() {
            return Err(DirectiveError::UnknownElement(element));
        }

        let plan = ListenerPlan::build(&directive, &self.config)?;
        let target = plan.target.resolve(element);
        if !self.dom.has_global(target) {
            tracing::error!(
                "Cannot bind {}: no {} in this host",
                directive.attribute,
                plan.target.name()
            );
            return Err(DirectiveError::MissingTarget {
                target: plan.target.name(),
                event: plan.event_name.clone(),
            });
        }

        let id = BindingId(self.next_id.get() + 1);
        self.next_id.set(id.0);

        let pipeline = Rc::new(Pipeline {
            binding: id,
            element,
            event_name: plan.event_name.clone(),
            expression: directive.expression.clone(),
            scope: scope.clone(),
            guards: plan.guards.clone(),
            once: plan.is_once(),
            fired: Cell::new(false),
            debouncer: plan.debounce_wait().map(|wait| Debouncer::new(wait, self.timers.clone())),
        });

        let runtime = Rc::downgrade(self);
        let weak_pipeline = Rc::downgrade(&pipeline);
        let callback = move |event: &mut Event| {
            if let (Some(runtime), Some(pipeline)) = (runtime.upgrade(), weak_pipeline.upgrade()) {
                runtime.run(&pipeline, event);
            }
        };

        let listener = if plan.is_outside() {
            self.tracker.register(&self.dom, id, element, &plan.event_name, Rc::new(callback));
            None
        } else {
            Some(self.dom.add_event_listener(target, &plan.event_name, plan.options, callback))
        };

        tracing::debug!(
            "Bound {} {}=\"{}\" on {:?} via {}",
            id,
            directive.attribute,
            directive.expression,
            element,
            plan.target.name()
        );
        self.bindings.borrow_mut().insert(
            id,
            Binding {
                element,
                directive,
                plan,
                pipeline,
                listener,
            },
        );
        Ok(id)
    }

    fn unbind(&self, id: BindingId) -> bool {
        let Some(binding) = self.bindings.borrow_mut().remove(&id) else {
            return false;
        };

        if let Some(listener) = binding.listener {
            self.dom.remove_event_listener(listener);
        }
        if binding.plan.is_outside() {
            self.tracker.unregister(id);
        }
        if let Some(debouncer) = &binding.pipeline.debouncer {
            debouncer.cancel();
        }
        tracing::debug!("Unbound {} ({})", id, binding.directive.attribute);
        true
    }

    fn unbind_removed(&self, removed: &[NodeId]) -> usize {
        let removed: HashSet<NodeId> = removed.iter().copied().collect();
        let ids: Vec<BindingId> = self
            .bindings
            .borrow()
            .iter()
            .filter(|(_, binding)| removed.contains(&binding.element))
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter().filter(|&id| self.unbind(id)).count()
    }

    /// Guard pipeline: key → stop → prevent → outside → debounce → once
    fn run(self: &Rc<Self>, pipeline: &Rc<Pipeline>, event: &mut Event) {
        if pipeline.once && pipeline.fired.get() {
            return;
        }

        for guard in &pipeline.guards {
            match guard {
                Guard::KeyMatch(filter) => {
                    if !filter.matches(event) {
                        tracing::trace!("{}: key filter rejected {:?}", pipeline.binding, event.key());
                        return;
                    }
                }
                Guard::StopPropagation => event.stop_propagation(),
                Guard::PreventDefault => event.prevent_default(),
                Guard::Outside => {
                    if !self.tracker.accepts(&self.dom, pipeline.element, event) {
                        tracing::trace!("{}: {} started inside", pipeline.binding, event.event_type);
                        return;
                    }
                }
                Guard::Debounce(_) => {
                    if let Some(debouncer) = &pipeline.debouncer {
                        let runtime = Rc::downgrade(self);
                        let weak_pipeline = Rc::downgrade(pipeline);
                        debouncer.schedule(event.clone(), move |mut event| {
                            if let (Some(runtime), Some(pipeline)) = (runtime.upgrade(), weak_pipeline.upgrade()) {
                                runtime.complete(&pipeline, &mut event);
                            }
                        });
                        tracing::trace!("{}: debounced for {:?}", pipeline.binding, debouncer.wait());
                        return;
                    }
                }
                Guard::Once => {}
            }
        }

        self.complete(pipeline, event);
    }

    /// Once gate, effect, and retirement of once bindings
    fn complete(&self, pipeline: &Pipeline, event: &mut Event) {
        if pipeline.once && pipeline.fired.replace(true) {
            return;
        }

        match self.evaluator.evaluate(&pipeline.expression, &pipeline.scope, event) {
            Ok(JsValue::Bool(false)) => event.prevent_default(),
            Ok(_) => {}
            Err(error) => self.report(EffectFailure {
                binding: pipeline.binding,
                element: pipeline.element,
                event: pipeline.event_name.clone(),
                expression: pipeline.expression.clone(),
                error,
            }),
        }

        if pipeline.once {
            self.unbind(pipeline.binding);
        }
    }

    fn report(&self, failure: EffectFailure) {
        tracing::warn!("{}", failure);
        let hooks: Vec<ErrorHook> = self.error_hooks.borrow().iter().cloned().collect();
        for hook in hooks {
            hook(&failure);
        }
    }
}

impl Drop for RuntimeInner {
    fn drop(&mut self) {
        let bindings = std::mem::take(self.bindings.get_mut());
        for (id, binding) in bindings {
            if let Some(listener) = binding.listener {
                self.dom.remove_event_listener(listener);
            }
            if binding.plan.is_outside() {
                self.tracker.unregister(id);
            }
        }
        if let Some(observer) = self.observer.take() {
            self.dom.disconnect_observer(observer);
        }
    }
}
