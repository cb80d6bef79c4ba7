// Copyright 2025 Canopy Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lifecycle behavior: destroy cascades, guards, expression registries,
//! value watches, and engine-internal contexts.

use canopy_context::{
    BoundExpression, Context, ContextGuard, Engine, FieldObject, NameSlotTable, ValueWatch,
};
use canopy_diagnostics::DiagnosticCode;
use pretty_assertions::assert_eq;

#[test]
fn destroy_detaches_but_does_not_destroy_children() {
    let engine = Engine::new();
    let parent = Context::new(&engine);
    let child = Context::with_parent(&parent);
    let grandchild = Context::with_parent(&child);
    child.set_property("kept", 1i64);

    parent.destroy();

    assert!(parent.is_destroyed());
    assert!(!child.is_destroyed());
    assert!(!grandchild.is_destroyed());

    // The child subtree is engine-detached and unparented, but intact
    assert!(child.engine().is_none());
    assert!(grandchild.engine().is_none());
    assert!(child.parent().is_none());
    assert_eq!(grandchild.parent(), Some(child.clone()));
    assert_eq!(
        child.property("kept").and_then(|v| v.as_integer()),
        Some(1)
    );
    assert_eq!(
        grandchild.property("kept").and_then(|v| v.as_integer()),
        Some(1)
    );
}

#[test]
fn destroy_unlinks_from_surviving_parent() {
    let engine = Engine::new();
    let parent = Context::new(&engine);
    let a = Context::with_parent(&parent);
    let b = Context::with_parent(&parent);

    assert_eq!(parent.children().len(), 2);
    a.destroy();
    assert_eq!(parent.children(), vec![b.clone()]);
    assert!(b.engine().is_some());
}

#[test]
fn guard_invalidated_by_destroy() {
    let engine = Engine::new();
    let context = Context::new(&engine);
    let guard = ContextGuard::new(&context);
    assert!(guard.is_valid());
    assert_eq!(guard.get(), Some(context.clone()));

    context.destroy();

    // The external handle still exists; the guard reads invalid anyway
    assert!(!guard.is_valid());
    assert!(guard.get().is_none());
    assert!(guard.get().is_none());
}

#[test]
fn empty_guard_is_invalid() {
    let guard = ContextGuard::empty();
    assert!(!guard.is_valid());
    assert!(guard.get().is_none());
}

#[test]
fn first_set_refreshes_overwrite_notifies() {
    let engine = Engine::new();
    let context = Context::new(&engine);
    let expression = BoundExpression::new();
    expression.attach(&context);

    context.set_property("x", 1i64);
    assert_eq!(expression.refresh_count(), 1);

    let watch = ValueWatch::watch(&context, "x").expect("slot exists after first set");

    // Overwriting an existing slot must not refresh, only notify
    context.set_property("x", 2i64);
    assert_eq!(expression.refresh_count(), 1);
    assert_eq!(watch.change_count(), 1);

    // A different slot's first set refreshes and leaves the watch alone
    context.set_property("y", 1i64);
    assert_eq!(expression.refresh_count(), 2);
    assert_eq!(watch.change_count(), 1);

    context.set_property("y", 2i64);
    assert_eq!(watch.change_count(), 1);
}

#[test]
fn ancestor_first_set_refreshes_descendant_expressions() {
    let engine = Engine::new();
    let parent = Context::new(&engine);
    let child = Context::with_parent(&parent);
    let expression = BoundExpression::new();
    expression.attach(&child);

    parent.set_property("a", 1i64);
    assert_eq!(expression.refresh_count(), 1);

    // Overwrite at the ancestor is value-only
    parent.set_property("a", 2i64);
    assert_eq!(expression.refresh_count(), 1);
}

#[test]
fn default_object_attach_and_detach_refresh() {
    let engine = Engine::new();
    let context = Context::new(&engine);
    let expression = BoundExpression::new();
    expression.attach(&context);
    let data = FieldObject::new("DataSet").with_field("a", 1i64).into_handle();

    context.add_default_object(&data);
    assert_eq!(expression.refresh_count(), 1);

    context.remove_default_object(&data);
    assert_eq!(expression.refresh_count(), 2);

    // Removing an object that was never attached is a no-op
    assert!(!context.remove_default_object(&data));
    assert_eq!(expression.refresh_count(), 2);
}

#[test]
fn refresh_invalidates_cached_shortcut() {
    let engine = Engine::new();
    let context = Context::new(&engine);
    context.set_property("x", 1i64);

    let expression = BoundExpression::new();
    expression.attach(&context);
    assert!(!expression.has_cached_shortcut());

    assert_eq!(
        expression.evaluate("x").and_then(|v| v.as_integer()),
        Some(1)
    );
    assert!(expression.has_cached_shortcut());

    context.set_property("fresh", 1i64);
    assert!(!expression.has_cached_shortcut());
}

#[test]
fn expression_reattach_moves_registration() {
    let engine = Engine::new();
    let a = Context::new(&engine);
    let b = Context::new(&engine);
    let expression = BoundExpression::new();

    expression.attach(&a);
    expression.attach(&b);
    assert_eq!(expression.context(), Some(b.clone()));

    // Structural changes on the old context no longer reach the expression
    a.set_property("x", 1i64);
    assert_eq!(expression.refresh_count(), 0);
    b.set_property("x", 1i64);
    assert_eq!(expression.refresh_count(), 1);

    expression.detach();
    assert!(expression.context().is_none());
    b.set_property("y", 1i64);
    assert_eq!(expression.refresh_count(), 1);
}

#[test]
fn destroy_tombstones_expressions_without_refreshing() {
    let engine = Engine::new();
    let context = Context::new(&engine);
    context.set_property("x", 1i64);

    let expression = BoundExpression::new();
    expression.attach(&context);
    let watch = ValueWatch::watch(&context, "x").expect("slot exists");
    assert!(watch.is_active());

    context.destroy();

    assert!(expression.context().is_none());
    assert_eq!(expression.refresh_count(), 0);
    assert!(expression.evaluate("x").is_none());
    assert!(!watch.is_active());
    assert_eq!(watch.change_count(), 0);
}

#[test]
fn watch_requires_existing_slot() {
    let engine = Engine::new();
    let context = Context::new(&engine);
    assert!(ValueWatch::watch(&context, "missing").is_none());
}

#[test]
fn internal_context_rejects_mutation_with_diagnostics() {
    let engine = Engine::new();
    let host = Context::new(&engine);
    let internal = engine.create_internal_context(&host);
    assert!(internal.is_internal());

    internal.set_property("x", 1i64);
    assert!(internal.property("x").is_none());

    let data = FieldObject::new("DataSet").into_handle();
    internal.add_default_object(&data);

    let codes: Vec<_> = engine
        .take_diagnostics()
        .into_iter()
        .map(|d| d.code)
        .collect();
    assert_eq!(
        codes,
        vec![
            DiagnosticCode::InternalContextMutation,
            DiagnosticCode::InternalContextDefaultObject,
        ]
    );

    // Resolution through an internal context still walks its chain
    host.set_property("a", 7i64);
    let leaf = Context::with_parent(&internal);
    assert_eq!(leaf.property("a").and_then(|v| v.as_integer()), Some(7));
}

#[test]
fn internal_children_are_destroyed_with_their_parent() {
    let engine = Engine::new();
    let host = Context::new(&engine);
    let internal = engine.create_internal_context(&host);

    host.destroy();
    assert!(internal.is_destroyed());
}

#[test]
fn id_binding_installation_diagnostics() {
    let engine = Engine::new();
    let context = Context::new(&engine);

    let ids = NameSlotTable::with_names(["item"]);
    context.install_id_bindings(&ids);
    context.install_id_bindings(&ids);

    let object = FieldObject::new("Item").into_handle();
    context.set_id_binding(3, &object);

    let codes: Vec<_> = engine
        .take_diagnostics()
        .into_iter()
        .map(|d| d.code)
        .collect();
    assert_eq!(
        codes,
        vec![
            DiagnosticCode::IdBindingsAlreadyInstalled,
            DiagnosticCode::IdBindingIndexOutOfRange,
        ]
    );
}

#[test]
#[should_panic(expected = "already bound")]
fn rebinding_a_live_id_slot_is_a_caller_bug() {
    let engine = Engine::new();
    let context = Context::new(&engine);
    let ids = NameSlotTable::with_names(["item"]);
    context.install_id_bindings(&ids);

    let first = FieldObject::new("Item").into_handle();
    let second = FieldObject::new("Item").into_handle();
    context.set_id_binding(0, &first);
    context.set_id_binding(0, &second);
}

#[test]
fn dropping_a_handle_keeps_sibling_chain_consistent() {
    let engine = Engine::new();
    let parent = Context::new(&engine);
    let a = Context::with_parent(&parent);
    let b = Context::with_parent(&parent);
    let c = Context::with_parent(&parent);

    // Children are linked newest-first
    assert_eq!(parent.children(), vec![c.clone(), b.clone(), a.clone()]);

    drop(b);
    assert_eq!(parent.children(), vec![c.clone(), a.clone()]);

    drop(c);
    assert_eq!(parent.children(), vec![a.clone()]);
}

#[test]
fn dropping_the_engine_detaches_surviving_contexts() {
    let engine = Engine::new();
    let context = Context::new(&engine);
    context.set_property("x", 1i64);

    drop(engine);

    assert!(!context.is_destroyed());
    assert!(context.engine().is_none());
    assert!(context.parent().is_none());
    assert_eq!(context.property("x").and_then(|v| v.as_integer()), Some(1));
}
