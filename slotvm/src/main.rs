use std::{error::Error, process::ExitCode};

use clap::Parser;
use slotvm::{ApiError, VM, VMCreateInfo};

const MAP: i32 = 0;
const KEY: i32 = 1;
const VALUE: i32 = 2;

/// Builds a map through the slot API and prints its elements in table order.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// entries to insert
    #[arg(value_name = "KEY=VALUE", required = true)]
    entries: Vec<String>,

    /// keys to remove after inserting, leaves tombstones behind
    #[arg(short, long, value_name = "KEY")]
    remove: Vec<String>,

    /// only print the element at this index, negative counts from the end
    #[arg(short, long, allow_negative_numbers = true)]
    index: Option<i64>,

    /// slots allocated when the VM is created
    #[arg(long, default_value_t = VMCreateInfo::default().initial_slots)]
    slots: usize,
}

/// null, true, false and numbers are parsed, anything else stays a string
fn set_value(vm: &mut VM, slot: i32, text: &str) -> Result<(), ApiError> {
    match text {
        "null" => vm.try_set_slot(slot, slotvm::Value::Null),
        "true" => vm.try_set_slot(slot, true.into()),
        "false" => vm.try_set_slot(slot, false.into()),
        _ => match text.parse::<f64>() {
            Ok(n) => vm.try_set_slot(slot, n.into()),
            Err(_) => vm.try_set_slot_string(slot, text),
        },
    }
}

fn print_element(vm: &mut VM, index: i64) -> Result<(), ApiError> {
    vm.try_get_map_element(MAP, index, KEY, VALUE)?;
    println!("[{index}] {} = {}", vm.try_get_slot(KEY)?, vm.try_get_slot(VALUE)?);
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut vm = VM::new(VMCreateInfo {
        initial_slots: args.slots,
        ..Default::default()
    });
    vm.ensure_slots(3);
    vm.try_set_slot_new_map(MAP)?;

    for entry in &args.entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got {entry:?}"))?;
        vm.try_set_slot_string(KEY, key)?;
        set_value(&mut vm, VALUE, value)?;
        vm.try_set_map_value(MAP, KEY, VALUE)?;
    }

    for key in &args.remove {
        vm.try_set_slot_string(KEY, key)?;
        if !vm.try_get_map_contains_key(MAP, KEY)? {
            log::warn!("{key:?} is not in the map");
            continue;
        }
        vm.try_remove_map_value(MAP, KEY, VALUE)?;
    }

    let count = vm.try_get_map_count(MAP)?;
    log::info!("map holds {count} entries");

    match args.index {
        Some(index) => print_element(&mut vm, index)?,
        None => {
            for index in 0..count {
                print_element(&mut vm, index as i64)?;
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
