// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A hook intercepts a value right after production, before any argument
//! bound to it observes it — here, to append an extra entry in place.

use wireup::{Function, Program, Slot};

fn main() -> Result<(), wireup::Error> {
    let mut program = Program::new();

    program.register(show_pet_names())?;
    program.register(amend_pet_names())?;
    program.register(provide_pet_names())?;
    program.register(provide_extra_pet_name())?;

    program.run(&mut ())?;
    program.clean();
    Ok(())
}

fn provide_pet_names() -> Function {
    let names = Slot::new();
    Function::builder("provide-pet-names")
        .output("PET_NAMES", &names)
        .body(move |_| {
            names.set(vec!["tom".to_string(), "jeff".to_string()]);
            Ok(())
        })
        .build()
}

fn provide_extra_pet_name() -> Function {
    let name = Slot::new();
    Function::builder("provide-extra-pet-name")
        .output("EXTRA_PET_NAME", &name)
        .body(move |_| {
            name.set("spike".to_string());
            Ok(())
        })
        .build()
}

/// Hooks `PET_NAMES` by address and appends the extra name in place.
fn amend_pet_names() -> Function {
    let extra = Slot::<String>::new();
    let names = Slot::<Slot<Vec<String>>>::new();
    let callback = Slot::new();
    Function::builder("amend-pet-names")
        .argument("EXTRA_PET_NAME", &extra)
        .hook("PET_NAMES", &names, &callback)
        .body({
            let callback = callback.clone();
            move |_| {
                let (extra, names) = (extra.clone(), names.clone());
                callback.set(Box::new(move |_| {
                    let handle = names.get().expect("hook target wired in");
                    let extra = extra.get().expect("argument wired in");
                    handle.with_mut(|list| list.push(extra.clone()));
                    Ok(())
                }));
                Ok(())
            }
        })
        .build()
}

fn show_pet_names() -> Function {
    let names = Slot::<Vec<String>>::new();
    Function::builder("show-pet-names")
        .argument("PET_NAMES", &names)
        .body(move |_| {
            println!("pet names: {}", names.get().unwrap_or_default().join(","));
            Ok(())
        })
        .build()
}
