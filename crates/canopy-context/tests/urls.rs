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

//! Relative reference resolution against the context chain's base URL.

use canopy_context::{Context, ContextError, Engine};
use pretty_assertions::assert_eq;
use url::Url;

fn url(s: &str) -> Url {
    Url::parse(s).expect("valid test url")
}

#[test]
fn resolves_against_nearest_ancestor_base() {
    let engine = Engine::new();
    let root = engine.root();
    root.set_base_url(url("file:///app/"));

    let child = Context::with_parent(&root);
    assert_eq!(child.resolved_url("x.view"), Ok(url("file:///app/x.view")));

    // A closer base wins over the root's
    let sub = Context::with_parent(&child);
    sub.set_base_url(url("file:///app/sub/"));
    let leaf = Context::with_parent(&sub);
    assert_eq!(
        leaf.resolved_url("x.view"),
        Ok(url("file:///app/sub/x.view"))
    );
}

#[test]
fn base_url_accessor_walks_the_chain() {
    let engine = Engine::new();
    let root = engine.root();
    let child = Context::with_parent(&root);
    assert_eq!(child.base_url(), None);

    root.set_base_url(url("https://example.com/assets/"));
    assert_eq!(child.base_url(), Some(url("https://example.com/assets/")));

    child.set_base_url(url("https://example.com/pages/"));
    assert_eq!(child.base_url(), Some(url("https://example.com/pages/")));
    assert_eq!(root.base_url(), Some(url("https://example.com/assets/")));
}

#[test]
fn absolute_references_pass_through() {
    let engine = Engine::new();
    let context = Context::new(&engine);
    context.set_base_url(url("file:///app/"));

    assert_eq!(
        context.resolved_url("https://example.com/data.json"),
        Ok(url("https://example.com/data.json"))
    );
}

#[test]
fn engine_base_is_the_fallback() {
    let engine = Engine::new();
    engine.set_base_url(url("file:///install/"));

    let context = Context::new(&engine);
    assert_eq!(
        context.resolved_url("theme.view"),
        Ok(url("file:///install/theme.view"))
    );

    // A context base takes precedence over the engine's
    context.set_base_url(url("file:///project/"));
    assert_eq!(
        context.resolved_url("theme.view"),
        Ok(url("file:///project/theme.view"))
    );
}

#[test]
fn missing_base_is_an_error() {
    let engine = Engine::new();
    let context = Context::new(&engine);

    assert_eq!(
        context.resolved_url("x.view"),
        Err(ContextError::NoBaseUrl {
            reference: "x.view".to_string()
        })
    );
}

#[test]
fn unjoinable_base_is_an_error() {
    let engine = Engine::new();
    let context = Context::new(&engine);
    context.set_base_url(url("mailto:ops@example.com"));

    assert_eq!(
        context.resolved_url("x.view"),
        Err(ContextError::InvalidReference {
            reference: "x.view".to_string(),
            base: url("mailto:ops@example.com"),
        })
    );
}

#[test]
fn detached_context_loses_the_engine_fallback() {
    let engine = Engine::new();
    engine.set_base_url(url("file:///install/"));
    let parent = Context::new(&engine);
    let child = Context::with_parent(&parent);

    parent.destroy();

    assert_eq!(
        child.resolved_url("x.view"),
        Err(ContextError::NoBaseUrl {
            reference: "x.view".to_string()
        })
    );
}
