// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(missing_docs, reason = "This is a test module")]

//! Integration tests for execution order, value propagation, and failure
//! handling.

use std::error::Error as _;

use wireup::{Argument, CallbackSlot, Error, Function, Hook, Output, Program, Slot};

type Log = Vec<&'static str>;

fn noop_body<Cx>() -> wireup::Body<Cx> {
    Box::new(|_| Ok(()))
}

#[test]
fn executes_in_dependency_order_with_hooks_interleaved() {
    // foo consumes x and y; bar turns x into y; baz produces x; qux hooks y.
    // Expected order: baz, qux, bar (callback fires right after), foo.
    let mut program: Program<Log> = Program::new();

    let foo_x = Slot::<i32>::new();
    let foo_y = Slot::<i32>::new();
    program
        .register(Function {
            tag: "foo".into(),
            arguments: vec![Argument::new("x", &foo_x), Argument::new("y", &foo_y)],
            body: Some(Box::new({
                let (foo_x, foo_y) = (foo_x.clone(), foo_y.clone());
                move |log: &mut Log| {
                    log.push("foo");
                    assert_eq!(foo_x.get(), Some(101));
                    assert_eq!(foo_y.get(), Some(404));
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("foo registers");

    let bar_x = Slot::<i32>::new();
    let bar_y = Slot::<i32>::new();
    program
        .register(Function {
            tag: "bar".into(),
            arguments: vec![Argument::new("x", &bar_x)],
            outputs: vec![Output::new("y", &bar_y)],
            body: Some(Box::new({
                let (bar_x, bar_y) = (bar_x.clone(), bar_y.clone());
                move |log: &mut Log| {
                    log.push("bar");
                    assert_eq!(bar_x.get(), Some(101));
                    bar_y.set(404);
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("bar registers");

    let baz_x = Slot::<i32>::new();
    program
        .register(Function {
            tag: "baz".into(),
            outputs: vec![Output::new("x", &baz_x)],
            body: Some(Box::new({
                let baz_x = baz_x.clone();
                move |log: &mut Log| {
                    log.push("baz");
                    baz_x.set(101);
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("baz registers");

    let qux_y = Slot::<i32>::new();
    let qux_callback: CallbackSlot<Log> = Slot::new();
    program
        .register(Function {
            tag: "qux".into(),
            hooks: vec![Hook::new("y", &qux_y, &qux_callback)],
            body: Some(Box::new({
                let qux_y = qux_y.clone();
                let qux_callback = qux_callback.clone();
                move |log: &mut Log| {
                    log.push("qux");
                    let qux_y = qux_y.clone();
                    qux_callback.set(Box::new(move |log: &mut Log| {
                        log.push("callback");
                        assert_eq!(qux_y.get(), Some(404));
                        Ok(())
                    }));
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("qux registers");

    let mut log = Log::new();
    program.run(&mut log).expect("run succeeds");
    assert_eq!(log, ["baz", "qux", "bar", "callback", "foo"]);
}

#[test]
fn alias_bindings_mutate_the_producer_storage() {
    let mut program: Program = Program::new();

    let produced = Slot::<Vec<i32>>::new();
    program
        .register(Function {
            tag: "produce".into(),
            outputs: vec![Output::new("DATA", &produced)],
            body: Some(Box::new({
                let produced = produced.clone();
                move |_| {
                    produced.set(vec![1, 2]);
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("producer registers");

    let aliased = Slot::<Slot<Vec<i32>>>::new();
    program
        .register(Function {
            tag: "mutate".into(),
            arguments: vec![Argument::new("DATA", &aliased)],
            body: Some(Box::new({
                let aliased = aliased.clone();
                move |_| {
                    let handle = aliased.get().expect("alias handle wired in");
                    handle.with_mut(|values| values.push(3));
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("mutator registers");

    let copied = Slot::<Vec<i32>>::new();
    program
        .register(Function {
            tag: "observe".into(),
            arguments: vec![Argument::new("DATA", &copied)],
            body: Some(Box::new({
                let copied = copied.clone();
                move |_| {
                    assert_eq!(copied.get(), Some(vec![1, 2, 3]));
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("observer registers");

    program.run(&mut ()).expect("run succeeds");
    assert_eq!(produced.get(), Some(vec![1, 2, 3]));
}

#[test]
fn hook_sees_the_value_before_any_argument() {
    // P produces LIST = [a, b]; M hooks LIST and appends the EXTRA value it
    // consumes as an argument; S consumes LIST and must observe [a, b, c].
    let mut program: Program = Program::new();

    let s_list = Slot::<Vec<String>>::new();
    program
        .register(Function {
            tag: "show".into(),
            arguments: vec![Argument::new("LIST", &s_list)],
            body: Some(Box::new({
                let s_list = s_list.clone();
                move |_| {
                    assert_eq!(
                        s_list.get(),
                        Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
                    );
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("consumer registers");

    let m_extra = Slot::<String>::new();
    let m_list = Slot::<Slot<Vec<String>>>::new();
    let m_callback: CallbackSlot<()> = Slot::new();
    program
        .register(Function {
            tag: "modify".into(),
            arguments: vec![Argument::new("EXTRA", &m_extra)],
            hooks: vec![Hook::new("LIST", &m_list, &m_callback)],
            body: Some(Box::new({
                let (m_extra, m_list) = (m_extra.clone(), m_list.clone());
                let m_callback = m_callback.clone();
                move |_| {
                    let (m_extra, m_list) = (m_extra.clone(), m_list.clone());
                    m_callback.set(Box::new(move |_| {
                        let extra = m_extra.get().expect("argument wired in");
                        let handle = m_list.get().expect("hook target wired in");
                        handle.with_mut(|list| list.push(extra.clone()));
                        Ok(())
                    }));
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("modifier registers");

    let p_list = Slot::<Vec<String>>::new();
    program
        .register(Function {
            tag: "provide".into(),
            outputs: vec![Output::new("LIST", &p_list)],
            body: Some(Box::new({
                let p_list = p_list.clone();
                move |_| {
                    p_list.set(vec!["a".to_string(), "b".to_string()]);
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("producer registers");

    let e_extra = Slot::<String>::new();
    program
        .register(Function {
            tag: "extra".into(),
            outputs: vec![Output::new("EXTRA", &e_extra)],
            body: Some(Box::new({
                let e_extra = e_extra.clone();
                move |_| {
                    e_extra.set("c".to_string());
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("extra producer registers");

    program.run(&mut ()).expect("run succeeds");
}

#[test]
fn unresolved_optional_argument_leaves_the_target_untouched() {
    let mut program: Program = Program::new();

    let y_out = Slot::<i32>::new();
    program
        .register(Function {
            tag: "foo".into(),
            outputs: vec![Output::new("y", &y_out)],
            body: Some(Box::new({
                let y_out = y_out.clone();
                move |_| {
                    y_out.set(199);
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("producer registers");

    let x_in = Slot::<i32>::new();
    x_in.set(100);
    let y_in = Slot::<i32>::new();
    program
        .register(Function {
            tag: "bar".into(),
            arguments: vec![
                Argument::optional("x", &x_in),
                Argument::new("y", &y_in),
            ],
            body: Some(Box::new({
                let (x_in, y_in) = (x_in.clone(), y_in.clone());
                move |_| {
                    let x = x_in.get().expect("prefilled default untouched");
                    let y = y_in.get().expect("wired in");
                    assert_eq!(y - x, 99);
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("consumer registers");

    program.run(&mut ()).expect("run succeeds");
    assert_eq!(x_in.get(), Some(100));
}

#[test]
fn body_failure_aborts_the_run() {
    let mut program: Program<Log> = Program::new();

    let x_out = Slot::<i32>::new();
    program
        .register(Function {
            tag: "first".into(),
            outputs: vec![Output::new("x", &x_out)],
            body: Some(Box::new({
                let x_out = x_out.clone();
                move |log: &mut Log| {
                    log.push("first");
                    x_out.set(1);
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("first registers");

    let x_in = Slot::<i32>::new();
    program
        .register(Function {
            tag: "second".into(),
            arguments: vec![Argument::new("x", &x_in)],
            body: Some(Box::new(|log: &mut Log| {
                log.push("second");
                Err("boom".into())
            })),
            ..Function::default()
        })
        .expect("second registers");

    let never = Slot::<i32>::new();
    program
        .register(Function {
            tag: "third".into(),
            arguments: vec![Argument::optional("x", &never)],
            body: Some(Box::new(|log: &mut Log| {
                log.push("third");
                Ok(())
            })),
            ..Function::default()
        })
        .expect("third registers");

    let mut log = Log::new();
    let error = program.run(&mut log).expect_err("second body fails");

    assert_eq!(error.to_string(), "function failed; tag=\"second\": boom");
    assert!(matches!(error, Error::FunctionFailed { .. }));
    let source = error.source().expect("cause preserved");
    assert_eq!(source.to_string(), "boom");
    assert_eq!(log, ["first", "second"]);
}

#[test]
fn callback_failure_aborts_the_run() {
    let mut program: Program<Log> = Program::new();

    let hooked = Slot::<i32>::new();
    let callback: CallbackSlot<Log> = Slot::new();
    program
        .register(Function {
            tag: "watcher".into(),
            hooks: vec![Hook::new("x", &hooked, &callback)],
            body: Some(Box::new({
                let callback = callback.clone();
                move |log: &mut Log| {
                    log.push("watcher");
                    callback.set(Box::new(|_| Err("listener down".into())));
                    Ok(())
                }
            })),
            ..Function::default()
        })
        .expect("watcher registers");

    let x_out = Slot::<i32>::new();
    program
        .register(Function {
            tag: "producer".into(),
            outputs: vec![Output::new("x", &x_out)],
            body: Some(Box::new(|log: &mut Log| {
                log.push("producer");
                Ok(())
            })),
            ..Function::default()
        })
        .expect("producer registers");

    let x_in = Slot::<i32>::new();
    program
        .register(Function {
            tag: "consumer".into(),
            arguments: vec![Argument::new("x", &x_in)],
            body: Some(Box::new(|log: &mut Log| {
                log.push("consumer");
                Ok(())
            })),
            ..Function::default()
        })
        .expect("consumer registers");

    let mut log = Log::new();
    let error = program.run(&mut log).expect_err("callback fails");

    assert_eq!(
        error.to_string(),
        "callback failed; tag=\"watcher\" in_value_id=\"x\": listener down"
    );
    let source = error.source().expect("cause preserved");
    assert_eq!(source.to_string(), "listener down");
    // The consumer bound to x never runs: fan-out happens before dependents.
    assert_eq!(log, ["watcher", "producer"]);
}

#[test]
fn unprovisioned_callback_aborts_before_the_producer_runs() {
    let mut program: Program<Log> = Program::new();

    let x_out = Slot::<i32>::new();
    program
        .register(Function {
            tag: "producer".into(),
            outputs: vec![Output::new("x", &x_out)],
            body: Some(Box::new(|log: &mut Log| {
                log.push("producer");
                Ok(())
            })),
            ..Function::default()
        })
        .expect("producer registers");

    let hooked = Slot::<i32>::new();
    let callback: CallbackSlot<Log> = Slot::new();
    program
        .register(Function {
            tag: "watcher".into(),
            hooks: vec![Hook::new("x", &hooked, &callback)],
            body: Some(Box::new(|log: &mut Log| {
                log.push("watcher");
                Ok(())
            })),
            ..Function::default()
        })
        .expect("watcher registers");

    let mut log = Log::new();
    let error = program.run(&mut log).expect_err("callback never provisioned");

    assert_eq!(
        error.to_string(),
        "callback not provisioned; tag=\"watcher\" in_value_id=\"x\""
    );
    assert!(matches!(error, Error::CallbackNotProvisioned { .. }));
    assert_eq!(log, ["watcher"]);
}

#[test]
fn unprovisioned_cleanup_aborts_the_run() {
    let mut program: Program = Program::new();

    let cleanup = Slot::new();
    program
        .register(Function {
            tag: "leaky".into(),
            cleanup: Some(cleanup),
            body: Some(noop_body()),
            ..Function::default()
        })
        .expect("function registers");

    let error = program.run(&mut ()).expect_err("cleanup never provisioned");
    assert_eq!(error.to_string(), "cleanup not provisioned; tag=\"leaky\"");
    assert!(matches!(error, Error::CleanupNotProvisioned { .. }));
}

#[test]
fn cleanup_is_checked_before_callbacks() {
    let mut program: Program = Program::new();

    let x_out = Slot::<i32>::new();
    program
        .register(Function {
            tag: "producer".into(),
            outputs: vec![Output::new("x", &x_out)],
            body: Some(noop_body()),
            ..Function::default()
        })
        .expect("producer registers");

    let hooked = Slot::<i32>::new();
    let callback: CallbackSlot<()> = Slot::new();
    let cleanup = Slot::new();
    program
        .register(Function {
            tag: "watcher".into(),
            hooks: vec![Hook::new("x", &hooked, &callback)],
            cleanup: Some(cleanup),
            body: Some(noop_body()),
            ..Function::default()
        })
        .expect("watcher registers");

    let error = program.run(&mut ()).expect_err("nothing provisioned");
    assert!(matches!(error, Error::CleanupNotProvisioned { .. }));
}

#[test]
fn registration_order_does_not_change_the_outcome() {
    for reversed in [false, true] {
        let mut program: Program<Log> = Program::new();

        let x_out = Slot::<i32>::new();
        let producer = Function {
            tag: "producer".into(),
            outputs: vec![Output::new("x", &x_out)],
            body: Some(Box::new({
                let x_out = x_out.clone();
                move |log: &mut Log| {
                    log.push("producer");
                    x_out.set(7);
                    Ok(())
                }
            })),
            ..Function::default()
        };

        let x_in = Slot::<i32>::new();
        let consumer = Function {
            tag: "consumer".into(),
            arguments: vec![Argument::new("x", &x_in)],
            body: Some(Box::new({
                let x_in = x_in.clone();
                move |log: &mut Log| {
                    log.push("consumer");
                    assert_eq!(x_in.get(), Some(7));
                    Ok(())
                }
            })),
            ..Function::default()
        };

        if reversed {
            program.register(consumer).expect("consumer registers");
            program.register(producer).expect("producer registers");
        } else {
            program.register(producer).expect("producer registers");
            program.register(consumer).expect("consumer registers");
        }

        let mut log = Log::new();
        program.run(&mut log).expect("run succeeds");
        assert_eq!(log, ["producer", "consumer"]);
    }
}
