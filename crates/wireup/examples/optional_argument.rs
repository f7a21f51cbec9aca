// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! An optional argument tolerates an unresolved value id: the target slot
//! keeps whatever default the caller put there.

use wireup::{Argument, Function, Output, Program, Slot};

fn main() -> Result<(), wireup::Error> {
    let mut program = Program::new();

    program.register(subtract())?;
    program.register(provide_y())?;

    program.run(&mut ())?;
    program.clean();
    Ok(())
}

fn provide_y() -> Function {
    let y = Slot::new();
    Function {
        tag: "provide-y".into(),
        outputs: vec![Output::new("y", &y)],
        body: Some(Box::new(move |_| {
            y.set(199_i64);
            Ok(())
        })),
        ..Function::default()
    }
}

fn subtract() -> Function {
    // Nothing produces "x", so the prefilled default survives resolution.
    let x = Slot::new();
    x.set(100_i64);
    let y = Slot::<i64>::new();
    Function {
        tag: "subtract".into(),
        arguments: vec![Argument::optional("x", &x), Argument::new("y", &y)],
        body: Some(Box::new(move |_| {
            let difference = y.get().unwrap_or_default() - x.get().unwrap_or_default();
            println!("y - x = {difference}");
            Ok(())
        })),
        ..Function::default()
    }
}
