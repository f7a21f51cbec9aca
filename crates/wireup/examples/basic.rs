// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Values flow between functions by id; registration order is insignificant.

use wireup::{Argument, Function, Output, Program, Slot};

fn main() -> Result<(), wireup::Error> {
    let mut program = Program::new();

    // Registered in a deliberately scrambled order; the program rearranges
    // the functions from the declared data dependencies.
    program.register(consume_all())?;
    program.register(double_x())?;
    program.register(sum_x_y())?;
    program.register(provide_x())?;

    program.run(&mut ())?;
    program.clean();
    Ok(())
}

fn provide_x() -> Function {
    let x = Slot::new();
    Function {
        tag: "provide-x".into(),
        outputs: vec![Output::new("x", &x)],
        body: Some(Box::new(move |_| {
            x.set(100_i64);
            println!("x = {}", x.get().unwrap_or_default());
            Ok(())
        })),
        ..Function::default()
    }
}

fn double_x() -> Function {
    let x = Slot::<i64>::new();
    let y = Slot::<i64>::new();
    Function {
        tag: "double-x".into(),
        arguments: vec![Argument::new("x", &x)],
        outputs: vec![Output::new("y", &y)],
        body: Some(Box::new(move |_| {
            let doubled = 2 * x.get().unwrap_or_default();
            y.set(doubled);
            println!("y = {doubled}");
            Ok(())
        })),
        ..Function::default()
    }
}

fn sum_x_y() -> Function {
    let x = Slot::<i64>::new();
    let y = Slot::<i64>::new();
    let z = Slot::<i64>::new();
    Function {
        tag: "sum-x-y".into(),
        arguments: vec![Argument::new("x", &x), Argument::new("y", &y)],
        outputs: vec![Output::new("z", &z)],
        body: Some(Box::new(move |_| {
            let sum = x.get().unwrap_or_default() + y.get().unwrap_or_default();
            z.set(sum);
            println!("z = {sum}");
            Ok(())
        })),
        ..Function::default()
    }
}

fn consume_all() -> Function {
    let x = Slot::<i64>::new();
    let y = Slot::<i64>::new();
    let z = Slot::<i64>::new();
    Function {
        tag: "consume-all".into(),
        arguments: vec![
            Argument::new("x", &x),
            Argument::new("y", &y),
            Argument::new("z", &z),
        ],
        body: Some(Box::new(move |_| {
            println!(
                "x, y, z = {}, {}, {}",
                x.get().unwrap_or_default(),
                y.get().unwrap_or_default(),
                z.get().unwrap_or_default()
            );
            Ok(())
        })),
        ..Function::default()
    }
}
