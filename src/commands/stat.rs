use clap;
use log::error;
use crate::bios::skew::{self,InterleaveTable};
use super::CommandError;
use crate::STDRESULT;

fn print_json(obj: json::JsonValue,indent: Option<u16>) {
    let s = match indent {
        Some(spaces) => json::stringify_pretty(obj,spaces),
        None => json::stringify(obj)
    };
    println!("{}",s);
}

pub fn interleave(cmd: &clap::ArgMatches) -> STDRESULT {
    let indent = cmd.get_one::<u16>("indent").copied();
    if let Some(list) = cmd.get_many::<u8>("detect") {
        let ids: Vec<u8> = list.copied().collect();
        return match skew::detect_interleave(&ids) {
            Some(stride) => {
                let mut root = json::JsonValue::new_object();
                root["sectors"] = ids.len().into();
                root["interleave"] = stride.into();
                print_json(root,indent);
                Ok(())
            },
            None => {
                error!("sector IDs should be distinct and consecutive");
                Err(Box::new(CommandError::OutOfRange))
            }
        };
    }
    let (spt,stride) = match (cmd.get_one::<u8>("sectors"),cmd.get_one::<u8>("interleave")) {
        (Some(spt),Some(stride)) => (*spt,*stride),
        _ => return Err(Box::new(CommandError::InvalidCommand))
    };
    let table = match InterleaveTable::build(spt,stride) {
        Ok(t) => t,
        Err(e) => {
            error!("{}",e);
            return Err(Box::new(e));
        }
    };
    let mut root = json::JsonValue::new_object();
    root["sectors"] = spt.into();
    root["interleave"] = stride.into();
    root["physical_order"] = table.physical_order().to_vec().into();
    print_json(root,indent);
    Ok(())
}

pub fn geometry(cmd: &clap::ArgMatches) -> STDRESULT {
    let geometry = super::get_geometry(cmd)?;
    println!("{}",geometry.to_json(cmd.get_one::<u16>("indent").copied())?);
    Ok(())
}
