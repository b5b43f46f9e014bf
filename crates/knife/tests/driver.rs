use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use knife::knife_path::Value;
use knife::{Knife, KnifeConfig, KnifeError, TemplateData};
use knife_test_fixtures::{many_packages, shapes};
use pretty_assertions::assert_eq;

fn config(workers: usize) -> KnifeConfig {
    KnifeConfig {
        workers,
        ..KnifeConfig::default()
    }
}

fn package_name(data: &TemplateData) -> anyhow::Result<String> {
    let name = data.func_map().call("at", &[data.root(), Value::string("Name")])?;
    Ok(name.to_string())
}

#[tokio::test]
async fn test_outputs_keep_package_order() {
    let knife = Knife::with_config(Arc::new(many_packages(8)), config(2));
    let packages = knife.packages();

    // later packages finish first
    let renderer = |data: &TemplateData| -> anyhow::Result<String> {
        let name = package_name(data)?;
        let rank = name.trim_start_matches('p').parse::<u64>().unwrap_or(0);
        std::thread::sleep(Duration::from_millis(8u64.saturating_sub(rank)));
        Ok(format!("{}\n", name))
    };
    let rendered = knife.render_each(&packages, Arc::new(renderer)).await.unwrap();

    let paths: Vec<&str> = rendered.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths[0], "example.com/shared");
    assert_eq!(paths[8], "example.com/p7");
    assert_eq!(
        rendered.iter().map(|r| r.package).collect::<Vec<_>>(),
        packages
    );

    let output = knife.execute(&packages, Arc::new(renderer)).await.unwrap();
    assert_eq!(output, "shared\np0\np1\np2\np3\np4\np5\np6\np7\n");
}

#[tokio::test]
async fn test_worker_limit_is_respected() {
    let knife = Knife::with_config(Arc::new(many_packages(6)), config(2));
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let (r, p) = (running.clone(), peak.clone());
    let renderer = move |_: &TemplateData| -> anyhow::Result<String> {
        let now = r.fetch_add(1, Ordering::SeqCst) + 1;
        p.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
        r.fetch_sub(1, Ordering::SeqCst);
        Ok(String::new())
    };
    knife
        .execute(&knife.packages(), Arc::new(renderer))
        .await
        .unwrap();

    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(running.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_render_failure_names_package() {
    let knife = Knife::with_config(Arc::new(many_packages(3)), config(1));
    let renderer = |data: &TemplateData| -> anyhow::Result<String> {
        if data.path() == "example.com/p1" {
            bail!("boom");
        }
        Ok(String::from("ok"))
    };
    let renderer = move |data: &TemplateData| renderer(data).context("render template");

    let err = knife
        .execute(&knife.packages(), Arc::new(renderer))
        .await
        .unwrap_err();
    match err {
        KnifeError::Render { package, message } => {
            assert_eq!(package, "example.com/p1");
            assert_eq!(message, "render template: boom");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_failure_stops_remaining_packages() {
    let knife = Knife::with_config(Arc::new(many_packages(8)), config(1));
    let started = Arc::new(AtomicUsize::new(0));

    let counter = started.clone();
    let renderer = move |data: &TemplateData| -> anyhow::Result<String> {
        counter.fetch_add(1, Ordering::SeqCst);
        if data.path() == "example.com/p1" {
            bail!("boom");
        }
        Ok(String::new())
    };
    let err = knife
        .render_each(&knife.packages(), Arc::new(renderer))
        .await
        .unwrap_err();

    assert!(matches!(err, KnifeError::Render { ref package, .. } if package == "example.com/p1"));
    // shared, p0 and p1 ran; nothing after the failure was started
    assert_eq!(started.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_selected_packages_and_unknown_path() {
    let fx = shapes();
    let knife = Knife::new(Arc::new(fx.graph));

    let packages = knife.resolve_paths(&["example.com/shapes", "io"]).unwrap();
    let output = knife
        .execute(&packages, Arc::new(|data: &TemplateData| package_name(data)))
        .await
        .unwrap();
    assert_eq!(output, "shapesio");

    let err = knife.resolve_paths(&["io", "example.com/nope"]).unwrap_err();
    assert_eq!(err.to_string(), "Unknown package: example.com/nope");
}

#[tokio::test]
async fn test_config_reaches_templates() {
    let fx = shapes();
    let config = KnifeConfig::from_toml_str(
        r#"
        workers = 4
        exported_only = true

        [extra]
        header = "// generated"
        "#,
    )
    .unwrap();
    let knife = Knife::with_config(Arc::new(fx.graph), config);

    let renderer = |data: &TemplateData| -> anyhow::Result<String> {
        let funcs = data.func_map();
        let header = funcs.call("data", &[Value::string("header")])?;
        let names = funcs.call("at", &[data.root(), Value::string("FuncNames")])?;
        Ok(format!("{}\n{}\n", header, names))
    };
    let output = knife
        .execute(&[fx.shapes], Arc::new(renderer))
        .await
        .unwrap();
    assert_eq!(output, "// generated\n[NewCircle]\n");
}

#[tokio::test]
async fn test_empty_package_list() {
    let knife = Knife::new(Arc::new(many_packages(1)));
    let rendered = knife
        .render_each(&[], Arc::new(|_: &TemplateData| anyhow::Ok(String::from("x"))))
        .await
        .unwrap();
    assert!(rendered.is_empty());
}
