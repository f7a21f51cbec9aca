// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bodies provision cleanups; teardown runs in reverse execution order.
//!
//! The open file is shared as a `Slot<File>` value: `File` is not `Clone`,
//! but a slot handle is, so consumers receive a handle to the same resource.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use wireup::{Argument, CleanupSlot, Function, Output, Program, Slot};

fn main() -> Result<(), wireup::Error> {
    let mut program = Program::new();

    program.register(write_scratch_file())?;
    program.register(create_scratch_dir())?;
    program.register(create_scratch_file())?;

    let result = program.run(&mut ());
    program.clean();
    result
}

fn create_scratch_dir() -> Function {
    let dir = Slot::new();
    let cleanup: CleanupSlot = Slot::new();
    Function {
        tag: "create-scratch-dir".into(),
        outputs: vec![Output::new("scratch-dir", &dir)],
        cleanup: Some(cleanup.clone()),
        body: Some(Box::new(move |_| {
            println!("create scratch dir");
            let path = std::env::temp_dir().join(format!("wireup-example-{}", std::process::id()));
            fs::create_dir_all(&path)?;
            dir.set(path.clone());
            cleanup.set(Box::new(move || {
                println!("delete scratch dir");
                let _ = fs::remove_dir(&path);
            }));
            Ok(())
        })),
        ..Function::default()
    }
}

fn create_scratch_file() -> Function {
    let dir = Slot::<PathBuf>::new();
    let file = Slot::<Slot<File>>::new();
    let cleanup: CleanupSlot = Slot::new();
    Function {
        tag: "create-scratch-file".into(),
        arguments: vec![Argument::new("scratch-dir", &dir)],
        outputs: vec![Output::new("scratch-file", &file)],
        cleanup: Some(cleanup.clone()),
        body: Some(Box::new(move |_| {
            println!("create and open scratch file");
            let path = dir.get().expect("scratch dir wired in").join("scratch");
            let open = Slot::new();
            open.set(File::create(&path)?);
            file.set(open);
            cleanup.set(Box::new(move || {
                println!("close and delete scratch file");
                let _ = fs::remove_file(&path);
            }));
            Ok(())
        })),
        ..Function::default()
    }
}

fn write_scratch_file() -> Function {
    let file = Slot::<Slot<File>>::new();
    Function {
        tag: "write-scratch-file".into(),
        arguments: vec![Argument::new("scratch-file", &file)],
        body: Some(Box::new(move |_| {
            println!("write scratch file");
            let handle = file.get().expect("scratch file wired in");
            if let Some(written) = handle.with_mut(|open| open.write_all(b"hello world")) {
                written?;
            }
            Ok(())
        })),
        ..Function::default()
    }
}
