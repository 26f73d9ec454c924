use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, Pat};

/// Time a function when the `perf_stats` feature is enabled.
///
/// The body is wrapped in a guard that logs elapsed time when it drops.
/// Without `perf_stats` the guard is compiled out entirely.
///
/// # Tick detection
/// A parameter named `tick` switches the guard to tick-aware logging: the
/// call is reported when it exceeds the threshold OR on every 100th tick.
/// - `tick: Res<FleetTick>` (any type whose path mentions `Tick`) reads `tick.0`
/// - `tick: u64` (any other type) is read as-is
///
/// # Example
/// ```ignore
/// #[profile]
/// pub fn run_fleet_governors(tick: Res<FleetTick>, roster: ResMut<FleetRoster>) {
///     // ...
/// }
///
/// #[profile(2)] // threshold in milliseconds
/// pub fn update_tick(&mut self, tick: u64, input: &FleetInput) { ... }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        attr.to_string().parse().unwrap_or(1)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    // None: no tick parameter. Some(true): resource wrapper, Some(false): plain integer.
    let tick_param = sig.inputs.iter().find_map(|arg| {
        let FnArg::Typed(pat_type) = arg else {
            return None;
        };
        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return None;
        };
        if pat_ident.ident != "tick" {
            return None;
        }
        let ty = &pat_type.ty;
        let type_str = quote!(#ty).to_string();
        Some(type_str.contains("Tick"))
    });

    let profile_guard_def = match tick_param {
        Some(wrapped) => {
            let tick_value = if wrapped {
                quote! { tick.0 }
            } else {
                quote! { tick as u64 }
            };
            quote! {
                struct ProfileGuard {
                    name: &'static str,
                    start: std::time::Instant,
                    tick_value: u64,
                }
                impl Drop for ProfileGuard {
                    fn drop(&mut self) {
                        let elapsed = self.start.elapsed();
                        if elapsed.as_millis() > #threshold_ms || (self.tick_value % 100 == 0) {
                            bevy::prelude::info!("[PERF] {} @ tick {}: {:?}", self.name, self.tick_value, elapsed);
                        }
                    }
                }
                ProfileGuard {
                    name: #fn_name_str,
                    start: std::time::Instant::now(),
                    tick_value: #tick_value,
                }
            }
        }
        None => quote! {
            struct ProfileGuard {
                name: &'static str,
                start: std::time::Instant,
            }
            impl Drop for ProfileGuard {
                fn drop(&mut self) {
                    let elapsed = self.start.elapsed();
                    if elapsed.as_millis() > #threshold_ms {
                        bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed);
                    }
                }
            }
            ProfileGuard {
                name: #fn_name_str,
                start: std::time::Instant::now(),
            }
        },
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                #profile_guard_def
            };

            #block
        }
    };

    output.into()
}
